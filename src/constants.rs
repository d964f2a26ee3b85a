pub const DEFAULT_QUALITY: u8 = 85;
pub const MIN_QUALITY: u8 = 60;
pub const MAX_QUALITY: u8 = 95;

/// Hard limits of the JPEG quality scale; configured bounds must stay inside.
pub const QUALITY_FLOOR: u8 = 1;
pub const QUALITY_CEILING: u8 = 100;

pub const MAX_WIDTH: u32 = 1920;
pub const MAX_HEIGHT: u32 = 1080;

pub const MAX_CONTENT_LENGTH: u64 = 50 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

pub const DEFAULT_UPLOAD_DIR: &str = "static/uploads";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SECRET_KEY: &str = "change-me";

pub const FILE_RETENTION_SECS: u64 = 7 * 24 * 3600;
pub const CLEANUP_INTERVAL_SECS: u64 = 24 * 3600;

/// How long `RetentionSweeper::stop` waits for the task before aborting it.
pub const SWEEPER_STOP_GRACE_SECS: u64 = 5;

pub const COMPRESSED_SUFFIX: &str = "_compressed";
pub const ARCHIVE_NAME: &str = "compressed_images.zip";
pub const DOWNLOAD_ROUTE: &str = "/download";

pub const LIBDEFLATER_HIGH_LEVEL: u8 = 12;
pub const LIBDEFLATER_LOW_LEVEL: u8 = 8;
pub const OXIPNG_PRESET: u8 = 2;
pub const PNG_HIGH_EFFORT_QUALITY: u8 = 70;
