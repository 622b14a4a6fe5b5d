//! Output formats and re-encoding.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};
use imagehost_core::AppError;
use std::io::Cursor;

const DEFAULT_JPEG_QUALITY: u8 = 85;
const DEFAULT_WEBP_QUALITY: f32 = 80.0;

/// Whitelisted output formats.
///
/// `Jpg` and `Jpeg` encode identically but are kept distinct so the output
/// filename reflects the extension the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Jpg,
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl TargetFormat {
    /// Parse a caller-supplied format name (case-insensitive). Anything
    /// outside the whitelist is a parameter error naming the format.
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.to_lowercase().as_str() {
            "jpg" => Ok(TargetFormat::Jpg),
            "jpeg" => Ok(TargetFormat::Jpeg),
            "png" => Ok(TargetFormat::Png),
            "gif" => Ok(TargetFormat::Gif),
            "webp" => Ok(TargetFormat::WebP),
            other => Err(AppError::Param(format!("Unsupported format: {}", other))),
        }
    }

    /// Format implied by a file extension. Unknown extensions fall back to
    /// JPEG, mirroring how sources without an extension are treated.
    pub fn from_extension(ext: &str) -> Self {
        TargetFormat::parse(ext).unwrap_or(TargetFormat::Jpg)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Jpg => "jpg",
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Png => "png",
            TargetFormat::Gif => "gif",
            TargetFormat::WebP => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            TargetFormat::Jpg | TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Png => "image/png",
            TargetFormat::Gif => "image/gif",
            TargetFormat::WebP => "image/webp",
        }
    }
}

/// Encode an image into the requested container.
///
/// `quality` applies to lossy containers (JPEG, WebP) as a 1-100 factor; PNG
/// and GIF re-encode losslessly and ignore it.
pub fn encode(
    img: &DynamicImage,
    format: TargetFormat,
    quality: Option<u8>,
) -> Result<Bytes, AppError> {
    match format {
        TargetFormat::Jpg | TargetFormat::Jpeg => {
            // JPEG carries no alpha; flatten before encoding.
            let rgb = img.to_rgb8();
            let mut buffer = Vec::new();
            let encoder = JpegEncoder::new_with_quality(
                Cursor::new(&mut buffer),
                quality.unwrap_or(DEFAULT_JPEG_QUALITY),
            );
            encoder
                .write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    ExtendedColorType::Rgb8,
                )
                .map_err(|e| AppError::Processing(format!("JPEG encoding failed: {}", e)))?;
            Ok(Bytes::from(buffer))
        }
        TargetFormat::Png => {
            let mut buffer = Vec::new();
            img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
                .map_err(|e| AppError::Processing(format!("PNG encoding failed: {}", e)))?;
            Ok(Bytes::from(buffer))
        }
        TargetFormat::Gif => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            let mut buffer = Vec::new();
            rgba.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Gif)
                .map_err(|e| AppError::Processing(format!("GIF encoding failed: {}", e)))?;
            Ok(Bytes::from(buffer))
        }
        TargetFormat::WebP => {
            let rgba = img.to_rgba8();
            let (width, height) = rgba.dimensions();
            let encoder = webp::Encoder::from_rgba(&rgba, width, height);
            let encoded =
                encoder.encode(quality.map_or(DEFAULT_WEBP_QUALITY, |q| q as f32));
            Ok(Bytes::copy_from_slice(&encoded))
        }
    }
}
