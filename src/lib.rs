pub mod batch;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod formats;
pub mod logger;
pub mod processing;
pub mod routes;
pub mod server;
pub mod storage;
pub mod sweeper;
pub mod upload;
pub mod utils;
pub mod validation;

pub use batch::{package_artifacts, PackagedArchive};
pub use config::AppConfig;
pub use error::{Result, SqueezeError};
pub use processing::{compress_bytes, fit_within, CompressedImage, CompressionOptions};
pub use server::{router, AppState};
pub use storage::Storage;
pub use sweeper::{sweep_expired, RetentionPolicy, RetentionSweeper, SweepReport, SweeperState};
pub use upload::{compress_batch, compress_upload, BatchUploadReport, CompressedUpload, IncomingFile};
