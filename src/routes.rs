//! HTTP handlers
//!
//! Handlers only extract and shape data; decoding, encoding, zipping and file
//! I/O run on the blocking pool.

use crate::batch::package_artifacts;
use crate::constants::ARCHIVE_NAME;
use crate::error::{Result, SqueezeError};
use crate::formats::mime_type_for;
use crate::server::AppState;
use crate::upload::{compress_batch, compress_upload, BatchUploadReport, IncomingFile, UploadResponse};
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

const INDEX_HTML: &str = include_str!("../assets/index.html");

const SINGLE_FILE_FIELD: &str = "file";
const BATCH_FILE_FIELD: &str = "files[]";
const QUALITY_FIELD: &str = "quality";

#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<IncomingFile>,
    quality: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct BatchDownloadRequest {
    #[serde(default)]
    pub filenames: Vec<String>,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[tracing::instrument(skip(state, multipart))]
pub async fn upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>> {
    let form = read_form(multipart, SINGLE_FILE_FIELD).await?;
    let file = form.files.into_iter().next().ok_or(SqueezeError::MissingFile)?;
    tracing::debug!(filename = %file.filename, quality = ?form.quality, "upload received");

    let quality = form.quality;
    let upload = tokio::task::spawn_blocking(move || {
        compress_upload(&state.storage, &state.config, &file, quality)
    })
    .await??;

    Ok(Json(upload.into()))
}

#[tracing::instrument(skip(state, multipart))]
pub async fn batch_upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchUploadReport>> {
    let form = read_form(multipart, BATCH_FILE_FIELD).await?;
    if form.files.is_empty() {
        return Err(SqueezeError::MissingFile);
    }
    tracing::debug!(files = form.files.len(), quality = ?form.quality, "batch upload received");

    let quality = form.quality;
    let files = form.files;
    let report = tokio::task::spawn_blocking(move || {
        compress_batch(&state.storage, &state.config, &files, quality)
    })
    .await?;

    tracing::info!(
        succeeded = report.results.len(),
        failed = report.errors.len(),
        "batch upload finished"
    );
    Ok(Json(report))
}

#[tracing::instrument(skip(state))]
pub async fn download(
    State(state): State<AppState>,
    axum::extract::Path(filename): axum::extract::Path<String>,
) -> Result<Response> {
    let name = filename.clone();
    let data = tokio::task::spawn_blocking(move || state.storage.load(&name)).await??;

    let content_type = mime_type_for(std::path::Path::new(&filename));
    Ok(attachment(data, content_type, &filename))
}

#[tracing::instrument(skip(state, payload))]
pub async fn download_batch(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BatchDownloadRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload.map_err(|e| SqueezeError::InvalidRequest(e.body_text()))?;
    if request.filenames.is_empty() {
        return Err(SqueezeError::InvalidRequest("no files selected".to_string()));
    }
    tracing::debug!(requested = request.filenames.len(), "batch download requested");

    let archive = tokio::task::spawn_blocking(move || {
        package_artifacts(&state.storage, &request.filenames)
    })
    .await??;

    tracing::info!(
        entries = archive.entries.len(),
        rejected = archive.rejected.len(),
        missing = archive.missing.len(),
        bytes = archive.data.len(),
        "archive built"
    );
    Ok(attachment(archive.data, "application/zip", ARCHIVE_NAME))
}

fn attachment(data: Vec<u8>, content_type: &str, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        data,
    )
        .into_response()
}

/// `attachment` disposition with the name quoted; quotes and backslashes are
/// escaped and control characters dropped.
fn content_disposition(filename: &str) -> String {
    let mut quoted = String::with_capacity(filename.len());
    for c in filename.chars().filter(|c| !c.is_control()) {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    format!("attachment; filename=\"{}\"", quoted)
}

/// Collects every `file_field` part and the optional quality.
///
/// A body that is not multipart/form-data is a 400 with the usual JSON error.
async fn read_form(
    multipart: std::result::Result<Multipart, MultipartRejection>,
    file_field: &str,
) -> Result<UploadForm> {
    let mut multipart = multipart.map_err(|e| SqueezeError::InvalidRequest(e.body_text()))?;
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            form.files.push(IncomingFile {
                filename,
                data: data.to_vec(),
            });
        } else if name == QUALITY_FIELD {
            let text = field.text().await?;
            form.quality = parse_quality(&text)?;
        }
    }

    Ok(form)
}

/// Empty means "use the default"; anything else must be an integer.
pub fn parse_quality(text: &str) -> Result<Option<i64>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<i64>()
        .map(Some)
        .map_err(|_| SqueezeError::InvalidRequest(format!("quality must be an integer, got '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quality() {
        assert_eq!(parse_quality("").unwrap(), None);
        assert_eq!(parse_quality(" 80 ").unwrap(), Some(80));
        assert_eq!(parse_quality("-3").unwrap(), Some(-3));
        assert!(matches!(
            parse_quality("high"),
            Err(SqueezeError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_content_disposition_escapes_name() {
        assert_eq!(
            content_disposition("abc_compressed.png"),
            "attachment; filename=\"abc_compressed.png\""
        );
        assert_eq!(
            content_disposition("a\"b\\c.png"),
            "attachment; filename=\"a\\\"b\\\\c.png\""
        );
        assert_eq!(
            content_disposition("evil\r\nSet-Cookie: x.png"),
            "attachment; filename=\"evilSet-Cookie: x.png\""
        );
    }
}
