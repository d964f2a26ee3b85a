/// Image format utilities and type-safe format handling
///
/// Maps between file extensions, the image crate's `ImageFormat` and the
/// MIME types used when serving stored files.
use image::ImageFormat;
use std::fmt;
use std::path::Path;

/// Formats the service can re-encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JPEG, lossy at the requested quality
    Jpeg,
    /// PNG, optimized with oxipng
    Png,
    /// GIF, first frame only
    Gif,
    /// WebP, lossless
    WebP,
}

impl OutputFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "gif" => Some(OutputFormat::Gif),
            "webp" => Some(OutputFormat::WebP),
            _ => None,
        }
    }

    /// Returns `None` for formats we can decode but not encode.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
            ImageFormat::Png => Some(OutputFormat::Png),
            ImageFormat::Gif => Some(OutputFormat::Gif),
            ImageFormat::WebP => Some(OutputFormat::WebP),
            _ => None,
        }
    }

    pub fn to_image_format(&self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::WebP => ImageFormat::WebP,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
            OutputFormat::WebP => "image/webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::Gif => "GIF",
            OutputFormat::WebP => "WebP",
        };
        write!(f, "{}", name)
    }
}

/// Picks the encoder for a decoded image.
///
/// The detected source format wins when we can encode it, then the format
/// named by the upload's extension, then JPEG.
pub fn resolve_output_format(
    detected: Option<ImageFormat>,
    extension_hint: Option<&str>,
) -> OutputFormat {
    detected
        .and_then(OutputFormat::from_image_format)
        .or_else(|| extension_hint.and_then(OutputFormat::from_extension))
        .unwrap_or(OutputFormat::Jpeg)
}

/// Content type for a stored file, based on its extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(OutputFormat::from_extension)
        .map(|format| format.mime_type())
        .unwrap_or("application/octet-stream")
}
