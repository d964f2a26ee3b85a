/// Helpers shared by the upload and packaging code
use crate::constants::COMPRESSED_SUFFIX;
use std::path::Path;

/// Formats a byte count as kibibytes with one decimal, e.g. `"812.4KB"`.
pub fn format_kib(bytes: u64) -> String {
    format!("{:.1}KB", bytes as f64 / 1024.0)
}

/// Calculate compression ratio as a percentage
///
/// Positive means the file shrank, negative means it grew. An empty original
/// reports 0.
pub fn calculate_compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    (1.0 - compressed_size as f64 / original_size as f64) * 100.0
}

pub fn format_ratio(ratio: f64) -> String {
    format!("{:.1}%", ratio)
}

/// Rounds to one decimal so the numeric and string forms agree.
pub fn round_ratio(ratio: f64) -> f64 {
    (ratio * 10.0).round() / 10.0
}

/// Strips the synthetic `_compressed` suffix from a stored file name.
///
/// `abc_compressed.jpg` becomes `abc.jpg`; names without the suffix are
/// returned unchanged.
pub fn display_name(stored: &str) -> String {
    let path = Path::new(stored);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(stored);
    let Some(base) = stem.strip_suffix(COMPRESSED_SUFFIX).filter(|b| !b.is_empty()) else {
        return stored.to_string();
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", base, ext),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_kib() {
        assert_eq!(format_kib(0), "0.0KB");
        assert_eq!(format_kib(512), "0.5KB");
        assert_eq!(format_kib(1024), "1.0KB");
        assert_eq!(format_kib(1536), "1.5KB");
        assert_eq!(format_kib(1024 * 1024), "1024.0KB");
    }

    #[test]
    fn test_calculate_compression_ratio() {
        assert!((calculate_compression_ratio(1000, 800) - 20.0).abs() < 1e-9);
        assert!((calculate_compression_ratio(1000, 250) - 75.0).abs() < 1e-9);
        assert_eq!(calculate_compression_ratio(1000, 1000), 0.0);
        assert_eq!(calculate_compression_ratio(0, 500), 0.0);
        assert!(calculate_compression_ratio(1000, 1200) < 0.0);
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(75.04), "75.0%");
        assert_eq!(format_ratio(-12.36), "-12.4%");
        assert_eq!(round_ratio(75.06), 75.1);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("abc_compressed.jpg"), "abc.jpg");
        assert_eq!(display_name("abc_compressed"), "abc");
        assert_eq!(display_name("photo.png"), "photo.png");
        assert_eq!(display_name("_compressed.png"), "_compressed.png");
        assert_eq!(display_name("a_compressed_compressed.gif"), "a_compressed.gif");
    }
}
