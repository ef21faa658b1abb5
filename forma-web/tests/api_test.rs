use std::net::SocketAddr;

use tempfile::TempDir;
use tokio::net::TcpListener;

use forma_core::config::ServiceConfig;
use forma_web::state::AppState;

/// Start the server on a random port with a scratch upload dir and database.
/// The TempDir must be kept alive for the duration of the test.
async fn start_test_server() -> (SocketAddr, TempDir) {
    let dir = TempDir::new().unwrap();
    let state = AppState::open(ServiceConfig {
        listen_port: 0,
        upload_dir: dir.path().join("uploads"),
        db_path: dir.path().join("forma.db"),
        convert_bin: "cp".to_string(),
    })
    .unwrap();
    let app = forma_web::build_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, dir)
}

#[tokio::test]
async fn test_health_endpoint() {
    let (addr, _dir) = start_test_server().await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/api/health", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_form_page_lists_extension_choices() {
    let (addr, _dir) = start_test_server().await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let html = response.text().await.unwrap();
    for ext in ["jpg", "pdf", "png", "doc"] {
        assert!(html.contains(&format!("<option value=\"{}\">", ext)));
    }
}

#[tokio::test]
async fn test_uploads_returns_empty_array() {
    let (addr, _dir) = start_test_server().await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/api/uploads", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body.is_array());
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_delete_nonexistent_upload_returns_404() {
    let (addr, _dir) = start_test_server().await;

    let client = reqwest::Client::new();
    let response = client
        .delete(format!("http://{}/api/uploads/nonexistent", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}
