use crate::config::AppConfig;
use crate::error::{Result, SqueezeError};

/// Returns the lower-cased extension of an uploaded file name if it is allowed.
///
/// The extension is whatever follows the last dot, so `archive.tar.png`
/// yields `png` and `png` (no dot) is rejected.
pub fn validate_upload_name(filename: &str, config: &AppConfig) -> Result<String> {
    if filename.trim().is_empty() {
        return Err(SqueezeError::EmptyFilename);
    }

    let extension = match filename.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_lowercase(),
        _ => {
            return Err(SqueezeError::DisallowedExtension(
                filename.to_string(),
                config.allowed_extensions_display(),
            ))
        }
    };

    if !config.is_allowed_extension(&extension) {
        return Err(SqueezeError::DisallowedExtension(
            filename.to_string(),
            config.allowed_extensions_display(),
        ));
    }

    Ok(extension)
}

pub fn validate_upload_size(size: u64, config: &AppConfig) -> Result<()> {
    if size > config.max_content_length {
        return Err(SqueezeError::FileTooLarge(size, config.max_content_length));
    }
    Ok(())
}

/// True when `name` can only refer to a file directly inside the storage
/// directory.
pub fn is_safe_stored_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains("..")
        && !name.starts_with('/')
        && !name.contains(['/', '\\', '\0'])
}

pub fn ensure_safe_stored_name(name: &str) -> Result<()> {
    if is_safe_stored_name(name) {
        Ok(())
    } else {
        Err(SqueezeError::UnsafeFilename(name.to_string()))
    }
}
