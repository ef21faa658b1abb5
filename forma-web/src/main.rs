use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use forma_core::config::ServiceConfig;
use forma_web::state::AppState;

#[derive(Parser)]
#[command(name = "forma-web", about = "File-format conversion form service")]
struct Cli {
    /// Path to config file (default: ~/.config/forma/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured listen port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ServiceConfig::load(cli.config.as_ref())?;
    if let Some(port) = cli.port {
        config.listen_port = port;
    }
    info!(
        upload_dir = %config.upload_dir.display(),
        db = %config.db_path.display(),
        convert_bin = %config.convert_bin,
        "loaded config"
    );

    let state = AppState::open(config)?;
    let app = forma_web::build_router(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], state.config().listen_port));
    info!("forma-web listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
