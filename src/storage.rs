//! The storage directory
//!
//! Compressed artifacts live as plain files in a single directory; the
//! directory listing is the only index. Names are `{uuid}_compressed.{ext}`.

use crate::constants::COMPRESSED_SUFFIX;
use crate::error::{Result, SqueezeError};
use crate::validation::ensure_safe_stored_name;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Opens the storage directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|_| SqueezeError::DirectoryCreationFailed(root.clone()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh artifact name for an upload with the given extension.
    ///
    /// Uniqueness rests on UUID v4; existing files are not checked.
    pub fn new_artifact_name(extension: &str) -> String {
        format!("{}{}.{}", Uuid::new_v4(), COMPRESSED_SUFFIX, extension)
    }

    /// Writes `data` under `name` and returns the size of the written file.
    ///
    /// The bytes go to a temp file in the same directory first and are then
    /// renamed into place, so readers never observe a partial artifact.
    pub fn store(&self, name: &str, data: &[u8]) -> Result<u64> {
        ensure_safe_stored_name(name)?;
        let target = self.root.join(name);

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| SqueezeError::Io(e.error))?;

        Ok(fs::metadata(&target)?.len())
    }

    /// Path of an existing artifact.
    pub fn locate(&self, name: &str) -> Result<PathBuf> {
        if ensure_safe_stored_name(name).is_err() {
            return Err(SqueezeError::NotFound(name.to_string()));
        }

        let path = self.root.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(SqueezeError::NotFound(name.to_string()))
        }
    }

    /// Reads an artifact. A file removed by the sweeper between lookup and
    /// read is reported as not found.
    pub fn load(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.locate(name)?;
        read_located(&path, name)
    }
}

fn read_located(path: &Path, name: &str) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => SqueezeError::NotFound(name.to_string()),
        _ => SqueezeError::Io(e),
    })
}
