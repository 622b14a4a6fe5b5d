//! The transformation pipeline: decode, apply one operation, re-encode.

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use imagehost_core::AppError;
use std::io::Cursor;
use std::sync::Arc;

use crate::encode::{self, TargetFormat};
use crate::ops::TransformOp;
use crate::watermark::{self, FontRenderer, TextRenderer};

/// Encoded output of a single transformation.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub data: Bytes,
    /// Extension the artifact should be stored under
    pub extension: String,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Applies a validated [`TransformOp`] to source bytes.
///
/// Stateless apart from the text renderer; one instance is shared across all
/// requests. Each call is a blocking decode-compute-encode unit of work.
pub struct TransformPipeline {
    renderer: Arc<dyn TextRenderer>,
}

impl TransformPipeline {
    pub fn new() -> Result<Self, AppError> {
        Ok(TransformPipeline {
            renderer: Arc::new(FontRenderer::new()?),
        })
    }

    /// Swap in an alternative text renderer (platform-specific backends,
    /// stubs in tests). Placement arithmetic is unaffected.
    pub fn with_renderer(renderer: Arc<dyn TextRenderer>) -> Self {
        TransformPipeline { renderer }
    }

    /// Run one operation against source bytes.
    ///
    /// `source_ext` is the source file's lowercased extension (already
    /// defaulted to `jpg` by the caller when absent); all operations except
    /// format conversion keep it for the output.
    pub fn apply(
        &self,
        source: &[u8],
        source_ext: &str,
        op: &TransformOp,
    ) -> Result<TransformOutput, AppError> {
        let img = ImageReader::new(Cursor::new(source))
            .with_guessed_format()
            .map_err(|e| AppError::Processing(format!("Failed to read image: {}", e)))?
            .decode()
            .map_err(|e| AppError::Processing(format!("Failed to decode image: {}", e)))?;

        let source_format = TargetFormat::from_extension(source_ext);

        let (result, format, quality) = match op {
            TransformOp::Resize { width, height } => {
                let resized = resize(&img, *width, *height)?;
                (resized, source_format, None)
            }
            TransformOp::Crop { width, height } => {
                let cropped = crop_centered(&img, *width, *height)?;
                (cropped, source_format, None)
            }
            TransformOp::Watermark { text, position } => {
                let marked = watermark::apply(img, text, *position, self.renderer.as_ref());
                (marked, source_format, None)
            }
            TransformOp::Compress { quality } => (img, source_format, Some(*quality)),
            TransformOp::Format { target } => (img, *target, None),
        };

        let (width, height) = result.dimensions();
        let data = encode::encode(&result, format, quality)?;

        tracing::debug!(
            op = op.kind(),
            width = width,
            height = height,
            output_bytes = data.len(),
            "Transformation applied"
        );

        Ok(TransformOutput {
            data,
            extension: format.extension().to_string(),
            content_type: format.mime_type(),
            width,
            height,
        })
    }
}

/// Filter choice mirrors the usual trade-off: sharper kernel when
/// downscaling, smoother when upscaling.
fn select_filter(src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> FilterType {
    if dst_w < src_w || dst_h < src_h {
        FilterType::Lanczos3
    } else {
        FilterType::CatmullRom
    }
}

/// Resize per the dimension rules: both present stretches exactly; a single
/// dimension scales the other by ratio with floor truncation.
fn resize(
    img: &DynamicImage,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<DynamicImage, AppError> {
    let (src_w, src_h) = img.dimensions();

    let (dst_w, dst_h) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => {
            let ratio = w as f64 / src_w as f64;
            (w, (src_h as f64 * ratio) as u32)
        }
        (None, Some(h)) => {
            let ratio = h as f64 / src_h as f64;
            ((src_w as f64 * ratio) as u32, h)
        }
        // Ruled out by TransformOp::resize validation.
        (None, None) => {
            return Err(AppError::Param(
                "Resize requires at least one of width or height".to_string(),
            ))
        }
    };

    if dst_w == 0 || dst_h == 0 {
        return Err(AppError::Param(format!(
            "Resize to {}x{} collapses a dimension to zero",
            dst_w, dst_h
        )));
    }

    let filter = select_filter(src_w, src_h, dst_w, dst_h);
    Ok(img.resize_exact(dst_w, dst_h, filter))
}

/// Crop a `width`x`height` region centered on the source. A region larger
/// than the source is rejected rather than padded.
fn crop_centered(img: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage, AppError> {
    let (src_w, src_h) = img.dimensions();

    if width > src_w || height > src_h {
        return Err(AppError::Param(format!(
            "Crop region {}x{} exceeds source dimensions {}x{}",
            width, height, src_w, src_h
        )));
    }

    let x = (src_w - width) / 2;
    let y = (src_h - height) / 2;
    Ok(img.crop_imm(x, y, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn pipeline() -> TransformPipeline {
        TransformPipeline::new().unwrap()
    }

    fn png_image(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
            .unwrap();
        buffer
    }

    fn dims_of(data: &[u8]) -> (u32, u32) {
        let img = image::load_from_memory(data).unwrap();
        img.dimensions()
    }

    #[test]
    fn test_resize_stretches_when_both_given() {
        let src = png_image(400, 300);
        let op = TransformOp::resize(Some(200), Some(50)).unwrap();
        let out = pipeline().apply(&src, "png", &op).unwrap();
        assert_eq!((out.width, out.height), (200, 50));
        assert_eq!(dims_of(&out.data), (200, 50));
    }

    #[test]
    fn test_resize_width_only_floors_height() {
        // 333/640 * 480 = 249.75 -> floor 249
        let src = png_image(640, 480);
        let op = TransformOp::resize(Some(333), None).unwrap();
        let out = pipeline().apply(&src, "png", &op).unwrap();
        assert_eq!((out.width, out.height), (333, 249));
    }

    #[test]
    fn test_resize_height_only_floors_width() {
        // 333/480 * 640 = 444.0 -> 444; try an uneven one: 101/480*640 = 134.66 -> 134
        let src = png_image(640, 480);
        let op = TransformOp::resize(None, Some(101)).unwrap();
        let out = pipeline().apply(&src, "png", &op).unwrap();
        assert_eq!((out.width, out.height), (134, 101));
    }

    #[test]
    fn test_crop_exact_center_region() {
        let src = png_image(400, 300);
        let op = TransformOp::crop(Some(100), Some(60)).unwrap();
        let out = pipeline().apply(&src, "png", &op).unwrap();
        assert_eq!((out.width, out.height), (100, 60));
        assert_eq!(dims_of(&out.data), (100, 60));
    }

    #[test]
    fn test_crop_center_anchor_pixels() {
        // Source gradient encodes x in the red channel; the crop's first
        // column must come from x = (400-100)/2 = 150.
        let src = png_image(400, 300);
        let op = TransformOp::crop(Some(100), Some(100)).unwrap();
        let out = pipeline().apply(&src, "png", &op).unwrap();
        let img = image::load_from_memory(&out.data).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(0, 0)[0], 150);
    }

    #[test]
    fn test_crop_larger_than_source_rejected() {
        let src = png_image(100, 100);
        let op = TransformOp::crop(Some(200), Some(50)).unwrap();
        let err = pipeline().apply(&src, "png", &op).unwrap_err();
        assert!(matches!(err, AppError::Param(_)));
        assert!(err.to_string().contains("200x50"));
    }

    #[test]
    fn test_watermark_keeps_pixels_and_dims() {
        let src = png_image(300, 200);
        let op = TransformOp::watermark(Some("acme"), Some("center")).unwrap();
        let out = pipeline().apply(&src, "png", &op).unwrap();
        assert_eq!((out.width, out.height), (300, 200));
    }

    #[test]
    fn test_compress_preserves_dimensions() {
        let src = png_image(123, 77);
        for quality in [1u32, 100] {
            let op = TransformOp::compress(Some(quality)).unwrap();
            let out = pipeline().apply(&src, "jpg", &op).unwrap();
            assert_eq!(dims_of(&out.data), (123, 77));
            assert_eq!(out.extension, "jpg");
        }
    }

    #[test]
    fn test_format_conversion_reencodes_full_resolution() {
        let src = png_image(64, 48);
        let op = TransformOp::convert_format(Some("webp")).unwrap();
        let out = pipeline().apply(&src, "png", &op).unwrap();
        assert_eq!(out.extension, "webp");
        assert_eq!(out.content_type, "image/webp");
        assert_eq!(&out.data[8..12], b"WEBP");
        assert_eq!((out.width, out.height), (64, 48));
    }

    #[test]
    fn test_undecodable_source_is_processing_error() {
        let op = TransformOp::compress(Some(50)).unwrap();
        let err = pipeline().apply(b"not an image", "jpg", &op).unwrap_err();
        assert!(matches!(err, AppError::Processing(_)));
    }
}
