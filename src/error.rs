use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqueezeError {
    #[error("No file was selected")]
    MissingFile,

    #[error("File name is empty")]
    EmptyFilename,

    #[error("Unsupported file type: {0}. Allowed extensions: {1}")]
    DisallowedExtension(String, String),

    #[error("File too large: {0} bytes. Maximum allowed: {1} bytes")]
    FileTooLarge(u64, u64),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsafe file name rejected: {0}")]
    UnsafeFilename(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("File not found or expired: {0}")]
    NotFound(String),

    #[error("Failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Malformed multipart request: {0}")]
    Multipart(#[from] MultipartError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Failed to create storage directory: {0}")]
    DirectoryCreationFailed(PathBuf),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SqueezeError>;

impl SqueezeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingFile
            | Self::EmptyFilename
            | Self::DisallowedExtension(..)
            | Self::InvalidRequest(_)
            | Self::UnsafeFilename(_) => StatusCode::BAD_REQUEST,
            Self::FileTooLarge(..) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Multipart(e) => e.status(),
            Self::ImageProcessing(_)
            | Self::PngOptimization(_)
            | Self::Archive(_)
            | Self::Io(_)
            | Self::WalkdirError(_)
            | Self::DirectoryCreationFailed(_)
            | Self::TaskFailed(_)
            | Self::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures caused by the client's input rather than the server.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<tokio::task::JoinError> for SqueezeError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed(err.to_string())
    }
}

impl IntoResponse for SqueezeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if self.is_client_error() {
            tracing::warn!(status = status.as_u16(), error = %message, "request rejected");
        } else {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
