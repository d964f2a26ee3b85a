use crate::config::AppConfig;
use crate::constants::{
    CLEANUP_INTERVAL_SECS, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_QUALITY, DEFAULT_SECRET_KEY,
    DEFAULT_UPLOAD_DIR, FILE_RETENTION_SECS, MAX_CONTENT_LENGTH, MAX_HEIGHT, MAX_QUALITY,
    MAX_WIDTH, MIN_QUALITY,
};
use crate::error::Result;
use crate::logger::LogFormat;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "img-squeeze-web",
    about = "A web service that compresses uploaded images",
    long_about = "img-squeeze-web accepts image uploads over HTTP, resizes them to fit a maximum box, \
                  re-encodes them at the requested quality and keeps the results available for download \
                  (one by one or as a zip archive) until a background sweep removes them.",
    version,
    after_help = "EXAMPLES:\n  \
    img-squeeze-web --port 8080 --upload-dir /tmp/squeeze\n  \
    SQUEEZE_MAX_QUALITY=90 SQUEEZE_RETENTION_SECS=3600 img-squeeze-web\n  \
    img-squeeze-web --allowed-extensions png,jpg --log-format json"
)]
pub struct Args {
    #[arg(long, env = "SQUEEZE_HOST", default_value = DEFAULT_HOST, help = "Address to bind")]
    pub host: String,

    #[arg(long, env = "SQUEEZE_PORT", default_value_t = DEFAULT_PORT, help = "Port to listen on")]
    pub port: u16,

    #[arg(
        long,
        env = "SQUEEZE_UPLOAD_DIR",
        default_value = DEFAULT_UPLOAD_DIR,
        help = "Directory where compressed images are stored"
    )]
    pub upload_dir: PathBuf,

    #[arg(
        long,
        env = "SQUEEZE_MAX_CONTENT_LENGTH",
        default_value_t = MAX_CONTENT_LENGTH,
        help = "Maximum request body size in bytes"
    )]
    pub max_content_length: u64,

    #[arg(
        long,
        env = "SQUEEZE_ALLOWED_EXTENSIONS",
        value_delimiter = ',',
        default_value = "png,jpg,jpeg,gif,webp",
        help = "Comma-separated list of accepted file extensions"
    )]
    pub allowed_extensions: Vec<String>,

    #[arg(
        long,
        env = "SQUEEZE_DEFAULT_QUALITY",
        default_value_t = DEFAULT_QUALITY,
        help = "Quality used when a request does not specify one"
    )]
    pub default_quality: u8,

    #[arg(
        long,
        env = "SQUEEZE_MIN_QUALITY",
        default_value_t = MIN_QUALITY,
        help = "Lowest quality a request may ask for (1-100)"
    )]
    pub min_quality: u8,

    #[arg(
        long,
        env = "SQUEEZE_MAX_QUALITY",
        default_value_t = MAX_QUALITY,
        help = "Highest quality a request may ask for (1-100)"
    )]
    pub max_quality: u8,

    #[arg(
        long,
        env = "SQUEEZE_MAX_WIDTH",
        default_value_t = MAX_WIDTH,
        help = "Images wider than this are scaled down"
    )]
    pub max_width: u32,

    #[arg(
        long,
        env = "SQUEEZE_MAX_HEIGHT",
        default_value_t = MAX_HEIGHT,
        help = "Images taller than this are scaled down"
    )]
    pub max_height: u32,

    #[arg(
        long,
        env = "SQUEEZE_RETENTION_SECS",
        default_value_t = FILE_RETENTION_SECS,
        help = "Age in seconds after which stored files are deleted"
    )]
    pub retention_secs: u64,

    #[arg(
        long,
        env = "SQUEEZE_CLEANUP_INTERVAL_SECS",
        default_value_t = CLEANUP_INTERVAL_SECS,
        help = "Seconds between two retention sweeps"
    )]
    pub cleanup_interval_secs: u64,

    #[arg(
        long,
        env = "SECRET_KEY",
        default_value = DEFAULT_SECRET_KEY,
        hide_env_values = true,
        hide_default_value = true,
        help = "Application secret"
    )]
    pub secret_key: String,

    #[arg(
        long,
        env = "SQUEEZE_LOG_LEVEL",
        default_value = "info",
        help = "Log filter (overridden by RUST_LOG)"
    )]
    pub log_level: String,

    #[arg(
        long,
        env = "SQUEEZE_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text,
        help = "Log output format"
    )]
    pub log_format: LogFormat,
}

impl Args {
    pub fn into_config(self) -> Result<AppConfig> {
        AppConfig {
            host: self.host,
            port: self.port,
            upload_dir: self.upload_dir,
            max_content_length: self.max_content_length,
            allowed_extensions: self.allowed_extensions,
            default_quality: self.default_quality,
            min_quality: self.min_quality,
            max_quality: self.max_quality,
            max_width: self.max_width,
            max_height: self.max_height,
            retention: Duration::from_secs(self.retention_secs),
            cleanup_interval: Duration::from_secs(self.cleanup_interval_secs),
            secret_key: self.secret_key,
        }
        .validate()
    }
}
