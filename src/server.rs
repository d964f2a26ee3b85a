use crate::config::AppConfig;
use crate::error::Result;
use crate::routes;
use crate::storage::Storage;
use crate::sweeper::RetentionPolicy;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Storage,
}

impl AppState {
    /// Opens (and creates if needed) the configured storage directory.
    pub fn new(config: AppConfig) -> Result<Self> {
        let storage = Storage::open(&config.upload_dir)?;
        Ok(Self {
            config: Arc::new(config),
            storage,
        })
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_age: self.config.retention,
            interval: self.config.cleanup_interval,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.max_content_length).unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(routes::index))
        .route("/upload", post(routes::upload))
        .route("/batch-upload", post(routes::batch_upload))
        .route("/download/:filename", get(routes::download))
        .route("/download-batch", post(routes::download_batch))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
