use anyhow::Context;
use clap::Parser;
use img_squeeze_web::cli::Args;
use img_squeeze_web::server::{router, shutdown_signal, AppState};
use img_squeeze_web::{logger, RetentionSweeper};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(&args.log_level, args.log_format)?;

    let config = args.into_config()?;
    if config.uses_default_secret() {
        tracing::warn!("SECRET_KEY is not set, using the built-in default");
    }
    tracing::debug!(?config, "configuration loaded");

    let state = AppState::new(config)?;
    let host = state.config.host.clone();
    let port = state.config.port;

    let sweeper = RetentionSweeper::new(state.storage.clone(), state.retention_policy());
    sweeper.start();

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {}:{}", host, port))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        upload_dir = %state.storage.root().display(),
        "img-squeeze-web listening"
    );

    let served = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweeper.stop().await;
    served.context("server error")?;
    Ok(())
}
