use crate::error::{Result, SqueezeError};
use crate::storage::Storage;
use crate::utils::display_name;
use crate::validation::is_safe_stored_name;
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

/// An in-memory zip built for one batch download
#[derive(Debug)]
pub struct PackagedArchive {
    pub data: Vec<u8>,
    /// Entry names in archive order
    pub entries: Vec<String>,
    /// Requested names refused as unsafe
    pub rejected: Vec<String>,
    /// Requested names with no backing file
    pub missing: Vec<String>,
}

/// Returns `base` if unused, otherwise `stem_1.ext`, `stem_2.ext`, ...
pub fn unique_entry_name(base: &str, used: &mut HashSet<String>) -> String {
    if used.insert(base.to_string()) {
        return base.to_string();
    }

    let path = Path::new(base);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(base);
    let extension = path.extension().and_then(|e| e.to_str());

    let mut counter = 1usize;
    loop {
        let candidate = match extension {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

/// Bundles the requested artifacts into a deflate-compressed zip.
///
/// Unsafe names are refused and absent files skipped, both per item. Fails
/// with `NotFound` when nothing valid is left, before any archive is built.
pub fn package_artifacts(storage: &Storage, filenames: &[String]) -> Result<PackagedArchive> {
    let mut rejected = Vec::new();
    let mut missing = Vec::new();
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    let mut used = HashSet::new();

    for name in filenames {
        if !is_safe_stored_name(name) {
            tracing::warn!(filename = %name, "refusing unsafe name in batch download");
            rejected.push(name.clone());
            continue;
        }

        match storage.load(name) {
            Ok(data) => {
                let entry = unique_entry_name(&display_name(name), &mut used);
                tracing::debug!(filename = %name, entry = %entry, "adding file to archive");
                files.push((entry, data));
            }
            Err(SqueezeError::NotFound(_)) => {
                tracing::warn!(filename = %name, "requested file does not exist or has expired");
                missing.push(name.clone());
            }
            Err(e) => return Err(e),
        }
    }

    if files.is_empty() {
        return Err(SqueezeError::NotFound(
            "none of the requested files exist".to_string(),
        ));
    }

    let data = build_zip(&files)?;
    let entries = files.into_iter().map(|(entry, _)| entry).collect();

    Ok(PackagedArchive {
        data,
        entries,
        rejected,
        missing,
    })
}

fn build_zip(files: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (entry, data) in files {
        zip.start_file(entry.as_str(), options)?;
        zip.write_all(data)?;
    }

    Ok(zip.finish()?.into_inner())
}
