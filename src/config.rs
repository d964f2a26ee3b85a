//! Application configuration
//!
//! Built once at startup (see `cli::Args::into_config`) and shared with the
//! handlers and the retention sweeper behind an `Arc`.

use crate::constants::{
    ALLOWED_EXTENSIONS, CLEANUP_INTERVAL_SECS, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_QUALITY,
    DEFAULT_SECRET_KEY, DEFAULT_UPLOAD_DIR, FILE_RETENTION_SECS, MAX_CONTENT_LENGTH, MAX_HEIGHT,
    MAX_QUALITY, MAX_WIDTH, MIN_QUALITY, QUALITY_CEILING, QUALITY_FLOOR,
};
use crate::error::{Result, SqueezeError};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding compressed artifacts
    pub upload_dir: PathBuf,
    /// Request body limit in bytes, also the per-file limit
    pub max_content_length: u64,
    /// Lower-case extensions without the leading dot
    pub allowed_extensions: Vec<String>,
    pub default_quality: u8,
    pub min_quality: u8,
    pub max_quality: u8,
    pub max_width: u32,
    pub max_height: u32,
    /// Files older than this are removed by the sweeper
    pub retention: Duration,
    pub cleanup_interval: Duration,
    pub secret_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_content_length: MAX_CONTENT_LENGTH,
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            default_quality: DEFAULT_QUALITY,
            min_quality: MIN_QUALITY,
            max_quality: MAX_QUALITY,
            max_width: MAX_WIDTH,
            max_height: MAX_HEIGHT,
            retention: Duration::from_secs(FILE_RETENTION_SECS),
            cleanup_interval: Duration::from_secs(CLEANUP_INTERVAL_SECS),
            secret_key: DEFAULT_SECRET_KEY.to_string(),
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("upload_dir", &self.upload_dir)
            .field("max_content_length", &self.max_content_length)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("default_quality", &self.default_quality)
            .field("min_quality", &self.min_quality)
            .field("max_quality", &self.max_quality)
            .field("max_width", &self.max_width)
            .field("max_height", &self.max_height)
            .field("retention", &self.retention)
            .field("cleanup_interval", &self.cleanup_interval)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl AppConfig {
    /// Checks the bounds and normalizes extensions and the default quality.
    pub fn validate(mut self) -> Result<Self> {
        let quality_range = QUALITY_FLOOR..=QUALITY_CEILING;
        if !quality_range.contains(&self.min_quality) || !quality_range.contains(&self.max_quality)
        {
            return Err(SqueezeError::InvalidConfig(format!(
                "quality bounds {}..={} must lie within {}..={}",
                self.min_quality, self.max_quality, QUALITY_FLOOR, QUALITY_CEILING
            )));
        }
        if self.min_quality > self.max_quality {
            return Err(SqueezeError::InvalidConfig(format!(
                "min quality {} exceeds max quality {}",
                self.min_quality, self.max_quality
            )));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(SqueezeError::InvalidConfig(
                "max width and height must be positive".to_string(),
            ));
        }
        if self.max_content_length == 0 {
            return Err(SqueezeError::InvalidConfig(
                "max content length must be positive".to_string(),
            ));
        }
        if self.cleanup_interval.is_zero() {
            return Err(SqueezeError::InvalidConfig(
                "cleanup interval must be positive".to_string(),
            ));
        }

        self.allowed_extensions = self
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self.allowed_extensions.sort();
        self.allowed_extensions.dedup();
        if self.allowed_extensions.is_empty() {
            return Err(SqueezeError::InvalidConfig(
                "at least one allowed extension is required".to_string(),
            ));
        }

        self.default_quality = self
            .default_quality
            .clamp(self.min_quality, self.max_quality);

        Ok(self)
    }

    /// Clamps a client-supplied quality into the configured bounds.
    pub fn clamp_quality(&self, requested: Option<i64>) -> u8 {
        match requested {
            None => self.default_quality,
            Some(q) => q.clamp(self.min_quality as i64, self.max_quality as i64) as u8,
        }
    }

    pub fn is_allowed_extension(&self, extension: &str) -> bool {
        let extension = extension.to_lowercase();
        self.allowed_extensions.iter().any(|allowed| *allowed == extension)
    }

    pub fn allowed_extensions_display(&self) -> String {
        self.allowed_extensions.join(", ")
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }
}
