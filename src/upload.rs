use crate::config::AppConfig;
use crate::constants::DOWNLOAD_ROUTE;
use crate::error::{Result, SqueezeError};
use crate::processing::{compress_bytes, CompressionOptions};
use crate::storage::Storage;
use crate::utils::{calculate_compression_ratio, format_kib, format_ratio, round_ratio};
use crate::validation::{validate_upload_name, validate_upload_size};
use rayon::prelude::*;
use serde::Serialize;

/// One file taken from a multipart request
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Metrics reported for a stored artifact
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompressedUpload {
    pub original_filename: String,
    /// Download path of the artifact
    pub compressed_image: String,
    pub original_size: String,
    pub compressed_size: String,
    pub compression_ratio: String,
    pub compression_percent: f64,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    pub width: u32,
    pub height: u32,
    /// Stored artifact name
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(flatten)]
    pub upload: CompressedUpload,
}

impl From<CompressedUpload> for UploadResponse {
    fn from(upload: CompressedUpload) -> Self {
        Self {
            success: true,
            upload,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchUploadReport {
    pub success: bool,
    pub results: Vec<CompressedUpload>,
    pub errors: Vec<String>,
}

/// Validates, compresses and stores one uploaded file.
///
/// Nothing is written unless validation and the transform both succeed.
pub fn compress_upload(
    storage: &Storage,
    config: &AppConfig,
    file: &IncomingFile,
    quality: Option<i64>,
) -> Result<CompressedUpload> {
    let extension = validate_upload_name(&file.filename, config)?;
    validate_upload_size(file.data.len() as u64, config)?;

    let options = CompressionOptions::for_request(config, quality);
    let compressed = compress_bytes(&file.data, Some(&extension), &options)?;

    let stored_name = Storage::new_artifact_name(&extension);
    let compressed_bytes = storage.store(&stored_name, &compressed.data)?;
    let original_bytes = compressed.original_size;
    let ratio = calculate_compression_ratio(original_bytes, compressed_bytes);

    tracing::info!(
        original = %file.filename,
        stored = %stored_name,
        format = %compressed.format,
        quality = options.quality,
        original_bytes,
        compressed_bytes,
        "image compressed"
    );

    Ok(CompressedUpload {
        original_filename: file.filename.clone(),
        compressed_image: format!("{}/{}", DOWNLOAD_ROUTE, stored_name),
        original_size: format_kib(original_bytes),
        compressed_size: format_kib(compressed_bytes),
        compression_ratio: format_ratio(ratio),
        compression_percent: round_ratio(ratio),
        original_bytes,
        compressed_bytes,
        width: compressed.width,
        height: compressed.height,
        filename: stored_name,
    })
}

/// Compresses every file independently on the rayon pool.
///
/// Each failure becomes exactly one entry in `errors`; the batch succeeds if
/// at least one file did.
pub fn compress_batch(
    storage: &Storage,
    config: &AppConfig,
    files: &[IncomingFile],
    quality: Option<i64>,
) -> BatchUploadReport {
    let outcomes: Vec<(String, Result<CompressedUpload>)> = files
        .par_iter()
        .map(|file| {
            (
                file.filename.clone(),
                compress_upload(storage, config, file, quality),
            )
        })
        .collect();

    let mut results = Vec::new();
    let mut errors = Vec::new();
    for (filename, outcome) in outcomes {
        match outcome {
            Ok(upload) => results.push(upload),
            Err(e) => {
                tracing::warn!(filename = %filename, error = %e, "batch item failed");
                errors.push(describe_failure(&filename, &e));
            }
        }
    }

    BatchUploadReport {
        success: !results.is_empty(),
        results,
        errors,
    }
}

fn describe_failure(filename: &str, error: &SqueezeError) -> String {
    match error {
        SqueezeError::EmptyFilename => "A file without a name was skipped".to_string(),
        SqueezeError::DisallowedExtension(..) => {
            format!("File {} is not a supported format", filename)
        }
        other => format!("Failed to process {}: {}", filename, other),
    }
}
