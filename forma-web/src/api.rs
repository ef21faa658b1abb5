use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use forma_core::contenttype::{content_type_for_extension, is_allowed_extension};
use forma_core::db::uploads;
use forma_core::storage;

use crate::form;
use crate::state::AppState;

/// Generic flash shown when the external command fails.
pub const FLASH_CONVERSION_FAILED: &str = "couldn't process file, internal error";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

// --- Conversion form ---

#[derive(Deserialize)]
pub struct FormPageParams {
    pub flash: Option<String>,
}

pub async fn form_page(Query(params): Query<FormPageParams>) -> Html<String> {
    Html(form::render_form(params.flash.as_deref()))
}

/// A parsed conversion submission.
struct Submission {
    convert_from: String,
    convert_to: String,
    file_name: String,
    file_bytes: Vec<u8>,
}

/// Read the multipart fields of a conversion submission.
async fn read_submission(mut multipart: Multipart) -> Result<Submission, String> {
    let mut convert_from = None;
    let mut convert_to = None;
    let mut file_name = None;
    let mut file_bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("invalid multipart data: {}", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "convert_from" => {
                convert_from = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| format!("unreadable convert_from field: {}", e))?,
                );
            }
            "convert_to" => {
                convert_to = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| format!("unreadable convert_to field: {}", e))?,
                );
            }
            "upload_input_file" => {
                file_name = field.file_name().map(String::from);
                file_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| format!("unreadable upload: {}", e))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let convert_from = convert_from.ok_or("missing convert_from field")?;
    let convert_to = convert_to.ok_or("missing convert_to field")?;
    let file_bytes = file_bytes.ok_or("missing upload_input_file field")?;
    let file_name = file_name.filter(|n| !n.is_empty()).ok_or("missing upload filename")?;

    Ok(Submission {
        convert_from,
        convert_to,
        file_name,
        file_bytes,
    })
}

/// Validate extensions against the allow-list and the upload filename.
fn validate(submission: &Submission) -> Result<(), String> {
    if !is_allowed_extension(&submission.convert_from) {
        return Err(format!(
            "unsupported source format '{}'",
            submission.convert_from
        ));
    }
    if !is_allowed_extension(&submission.convert_to) {
        return Err(format!(
            "unsupported target format '{}'",
            submission.convert_to
        ));
    }
    let (_, ext) = storage::split_filename(&submission.file_name)
        .map_err(|e| e.to_string())?;
    if !ext.eq_ignore_ascii_case(&submission.convert_from) {
        return Err(format!(
            "uploaded file '{}' does not match source format '{}'",
            submission.file_name, submission.convert_from
        ));
    }
    Ok(())
}

/// Re-render the form with a flash message.
fn form_with_flash(status: StatusCode, flash: &str) -> Response {
    (status, Html(form::render_form(Some(flash)))).into_response()
}

/// Handle a conversion submission: store the upload, record it, run the
/// external command, and stream the converted output back as an attachment.
pub async fn convert(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let submission = match read_submission(multipart).await {
        Ok(s) => s,
        Err(msg) => {
            warn!(reason = %msg, "rejected malformed submission");
            return form_with_flash(StatusCode::UNPROCESSABLE_ENTITY, &msg);
        }
    };

    if let Err(msg) = validate(&submission) {
        warn!(reason = %msg, "rejected invalid submission");
        return form_with_flash(StatusCode::UNPROCESSABLE_ENTITY, &msg);
    }

    let upload_dir = state.config().upload_dir.clone();

    // Store the upload and insert its record.
    let stored = match storage::store_upload(&upload_dir, &submission.file_name, &submission.file_bytes)
    {
        Ok(stored) => stored,
        Err(e) => {
            error!(error = %e, "failed to store upload");
            return form_with_flash(StatusCode::INTERNAL_SERVER_ERROR, FLASH_CONVERSION_FAILED);
        }
    };
    {
        let conn = state.conn().await;
        if let Err(e) = uploads::insert(
            &conn,
            &stored,
            &submission.file_name,
            &submission.convert_from,
            &submission.convert_to,
        ) {
            error!(error = %e, stored = %stored, "failed to record upload");
            return form_with_flash(StatusCode::INTERNAL_SERVER_ERROR, FLASH_CONVERSION_FAILED);
        }
    }

    // The external command blocks for the full conversion, so it runs on the
    // blocking pool.
    let converter = state.converter().clone();
    let task_dir = upload_dir.clone();
    let task_stored = stored.clone();
    let task_target = submission.convert_to.clone();
    let converted = tokio::task::spawn_blocking(move || {
        forma_core::convert::convert_upload(&converter, &task_dir, &task_stored, &task_target)
    })
    .await;

    let converted_path = match converted {
        Ok(Ok(path)) => path,
        Ok(Err(e)) => {
            warn!(stored = %stored, error = %e, "conversion failed");
            return form_with_flash(StatusCode::OK, FLASH_CONVERSION_FAILED);
        }
        Err(e) => {
            error!(stored = %stored, error = %e, "conversion task failed");
            return form_with_flash(StatusCode::INTERNAL_SERVER_ERROR, FLASH_CONVERSION_FAILED);
        }
    };

    let download = match storage::download_name(&stored, &submission.convert_to) {
        Ok(name) => name,
        Err(e) => {
            error!(stored = %stored, error = %e, "failed to derive download name");
            return form_with_flash(StatusCode::INTERNAL_SERVER_ERROR, FLASH_CONVERSION_FAILED);
        }
    };

    let bytes = match tokio::fs::read(&converted_path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(path = %converted_path.display(), error = %e, "failed to read converted output");
            return form_with_flash(StatusCode::INTERNAL_SERVER_ERROR, FLASH_CONVERSION_FAILED);
        }
    };

    // The artifact keeps its unique stored-derived path on disk; once the
    // bytes are in hand it has served its purpose.
    if let Err(e) = tokio::fs::remove_file(&converted_path).await {
        warn!(path = %converted_path.display(), error = %e, "failed to remove converted artifact");
    }

    info!(
        stored = %stored,
        download = %download,
        bytes = bytes.len(),
        "conversion complete"
    );

    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                content_type_for_extension(&submission.convert_to).to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download),
            ),
        ],
        bytes,
    )
        .into_response()
}

// --- Upload records ---

pub async fn list_uploads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<uploads::Upload>>, StatusCode> {
    let conn = state.conn().await;
    uploads::list(&conn)
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

pub async fn delete_upload(
    State(state): State<Arc<AppState>>,
    Path(stored_name): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let conn = state.conn().await;
    match uploads::delete(&conn, &state.config().upload_dir, &stored_name) {
        Ok(true) => Ok(StatusCode::NO_CONTENT),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!(stored = %stored_name, error = %e, "failed to delete upload");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_returns_ok() {
        let response = health().await;
        assert_eq!(response.status, "ok");
    }

    fn submission(from: &str, to: &str, file_name: &str) -> Submission {
        Submission {
            convert_from: from.to_string(),
            convert_to: to.to_string(),
            file_name: file_name.to_string(),
            file_bytes: b"bytes".to_vec(),
        }
    }

    #[test]
    fn test_validate_accepts_matching_submission() {
        assert!(validate(&submission("png", "jpg", "photo.png")).is_ok());
        // Extension comparison ignores case.
        assert!(validate(&submission("png", "jpg", "photo.PNG")).is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_extensions() {
        let err = validate(&submission("exe", "jpg", "app.exe")).unwrap_err();
        assert!(err.contains("unsupported source format"));

        let err = validate(&submission("png", "exe", "photo.png")).unwrap_err();
        assert!(err.contains("unsupported target format"));
    }

    #[test]
    fn test_validate_rejects_mismatched_filename() {
        let err = validate(&submission("png", "jpg", "photo.gif")).unwrap_err();
        assert!(err.contains("does not match source format"));
    }

    #[test]
    fn test_validate_rejects_filename_without_extension() {
        assert!(validate(&submission("png", "jpg", "photo")).is_err());
    }
}
