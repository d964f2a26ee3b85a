use crate::config::AppConfig;
use crate::constants::{
    LIBDEFLATER_HIGH_LEVEL, LIBDEFLATER_LOW_LEVEL, OXIPNG_PRESET, PNG_HIGH_EFFORT_QUALITY,
};
use crate::error::{Result, SqueezeError};
use crate::formats::{resolve_output_format, OutputFormat};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Frame, GenericImageView, ImageReader};
use oxipng::{Deflaters, Options};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionOptions {
    /// Already clamped into the configured bounds
    pub quality: u8,
    pub max_width: u32,
    pub max_height: u32,
}

impl CompressionOptions {
    /// Builds the options for one request; the requested quality is clamped
    /// here so no raw client value reaches an encoder.
    pub fn for_request(config: &AppConfig, requested_quality: Option<i64>) -> Self {
        Self {
            quality: config.clamp_quality(requested_quality),
            max_width: config.max_width,
            max_height: config.max_height,
        }
    }
}

/// Result of one transform
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub data: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub original_size: u64,
}

impl CompressedImage {
    pub fn compressed_size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Target dimensions for an image that exceeds the bounding box.
///
/// Returns `None` when the image already fits. The scale factor is the
/// smaller of the two axis ratios, so the aspect ratio is preserved and both
/// sides end up within the box (never below 1px).
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> Option<(u32, u32)> {
    if width == 0 || height == 0 || (width <= max_width && height <= max_height) {
        return None;
    }

    let (w, h) = (width as u64, height as u64);
    let (max_w, max_h) = (max_width as u64, max_height as u64);

    // Integer cross-multiplication keeps the limiting side exactly on the box.
    let (new_w, new_h) = if w * max_h >= h * max_w {
        (max_w, h * max_w / w)
    } else {
        (w * max_h / h, max_h)
    };

    Some((new_w.max(1) as u32, new_h.max(1) as u32))
}

/// Scales the image down in place if it exceeds the box. Returns whether it
/// was resized.
pub fn resize_to_fit(img: &mut DynamicImage, options: &CompressionOptions) -> bool {
    let (width, height) = img.dimensions();
    match fit_within(width, height, options.max_width, options.max_height) {
        Some((new_width, new_height)) => {
            tracing::debug!(
                from = %format!("{}x{}", width, height),
                to = %format!("{}x{}", new_width, new_height),
                "resizing image"
            );
            *img = img.resize_exact(new_width, new_height, FilterType::Lanczos3);
            true
        }
        None => false,
    }
}

/// Decodes `data`, fits it into the box and re-encodes it.
///
/// # Arguments
/// * `data` - Raw bytes of the uploaded image
/// * `extension_hint` - Extension of the uploaded file name, used when the
///   decoded format has no encoder
/// * `options` - Clamped quality and bounding box
///
/// # Returns
/// * `Ok(CompressedImage)` - Encoded bytes plus size and dimension metrics
/// * `Err(SqueezeError)` - If decoding or encoding fails
pub fn compress_bytes(
    data: &[u8],
    extension_hint: Option<&str>,
    options: &CompressionOptions,
) -> Result<CompressedImage> {
    let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
    let detected = reader.format();
    let mut img = reader.decode()?;

    resize_to_fit(&mut img, options);

    let format = resolve_output_format(detected, extension_hint);
    let encoded = encode_image(&img, format, options.quality)?;

    Ok(CompressedImage {
        data: encoded,
        format,
        width: img.width(),
        height: img.height(),
        original_size: data.len() as u64,
    })
}

pub fn encode_image(img: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut out, quality);
            // JPEG has no alpha channel
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
        }
        OutputFormat::Png => {
            let mut cursor = Cursor::new(Vec::new());
            img.write_to(&mut cursor, format.to_image_format())?;
            out = optimize_png(&cursor.into_inner(), quality)?;
        }
        OutputFormat::Gif => {
            let mut encoder = GifEncoder::new(&mut out);
            encoder.encode_frame(Frame::new(img.to_rgba8()))?;
        }
        OutputFormat::WebP => {
            let mut cursor = Cursor::new(Vec::new());
            DynamicImage::ImageRgba8(img.to_rgba8()).write_to(&mut cursor, format.to_image_format())?;
            out = cursor.into_inner();
        }
    }

    Ok(out)
}

/// Lossless PNG optimization; higher quality requests get more deflate effort.
fn optimize_png(png: &[u8], quality: u8) -> Result<Vec<u8>> {
    let mut options = Options::from_preset(OXIPNG_PRESET);
    options.deflate = if quality >= PNG_HIGH_EFFORT_QUALITY {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_HIGH_LEVEL,
        }
    } else {
        Deflaters::Libdeflater {
            compression: LIBDEFLATER_LOW_LEVEL,
        }
    };

    oxipng::optimize_from_memory(png, &options)
        .map_err(|e| SqueezeError::PngOptimization(e.to_string()))
}
