//! Text watermarking.
//!
//! Placement arithmetic is a pure function of the image size and the rendered
//! text width, so it stays testable with a stub renderer; the production
//! renderer draws an embedded bold face through `imageproc`.

use ab_glyph::{FontRef, PxScale};
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use imagehost_core::AppError;
use imageproc::drawing::{draw_text_mut, text_size};

use crate::ops::WatermarkPosition;

/// Font pixel height for the watermark line.
pub const WATERMARK_FONT_PX: f32 = 36.0;
/// Watermark text alpha out of 255 (semi-transparent black).
pub const WATERMARK_ALPHA: u8 = 60;
/// Horizontal inset from the left/right image edge.
const EDGE_INSET_X: i64 = 20;
/// Vertical offset for the top row of positions.
const TOP_Y: i64 = 50;
/// Vertical inset from the bottom image edge.
const BOTTOM_INSET_Y: i64 = 40;

static FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");

/// Text measurement and drawing capability.
///
/// Abstracts the font/graphics backend so the placement rules can be
/// exercised without rasterizing glyphs.
pub trait TextRenderer: Send + Sync {
    /// Rendered pixel width of a single text line.
    fn measure_text_width(&self, text: &str) -> u32;

    /// Draw a single semi-transparent text line with its top-left corner at
    /// `(x, y)`. Coordinates may be negative; drawing is clipped.
    fn draw_text(&self, image: &mut RgbaImage, text: &str, x: i64, y: i64);
}

/// Top-left origin for the watermark text.
///
/// `bottomright` is the default for an unspecified position. Coordinates can
/// go negative when the text is wider than the image; the renderer clips.
pub fn watermark_origin(
    position: WatermarkPosition,
    img_w: u32,
    img_h: u32,
    text_w: u32,
) -> (i64, i64) {
    let (img_w, img_h, text_w) = (img_w as i64, img_h as i64, text_w as i64);
    match position {
        WatermarkPosition::TopLeft => (EDGE_INSET_X, TOP_Y),
        WatermarkPosition::TopRight => (img_w - EDGE_INSET_X - text_w, TOP_Y),
        WatermarkPosition::BottomLeft => (EDGE_INSET_X, img_h - BOTTOM_INSET_Y),
        WatermarkPosition::BottomRight => {
            (img_w - EDGE_INSET_X - text_w, img_h - BOTTOM_INSET_Y)
        }
        WatermarkPosition::Center => ((img_w - text_w) / 2, img_h / 2),
    }
}

/// Apply a single-line text watermark. The source pixels are otherwise
/// unchanged.
pub fn apply(
    img: DynamicImage,
    text: &str,
    position: WatermarkPosition,
    renderer: &dyn TextRenderer,
) -> DynamicImage {
    let mut canvas = img.to_rgba8();
    let text_w = renderer.measure_text_width(text);
    let (x, y) = watermark_origin(position, canvas.width(), canvas.height(), text_w);

    tracing::debug!(
        position = position.as_str(),
        x = x,
        y = y,
        text_width = text_w,
        "Placing watermark"
    );

    renderer.draw_text(&mut canvas, text, x, y);
    DynamicImage::ImageRgba8(canvas)
}

/// Production renderer backed by an embedded DejaVu Sans Bold face.
pub struct FontRenderer {
    font: FontRef<'static>,
    scale: PxScale,
}

impl FontRenderer {
    pub fn new() -> Result<Self, AppError> {
        let font = FontRef::try_from_slice(FONT_BYTES)
            .map_err(|e| AppError::Internal(format!("Failed to load watermark font: {}", e)))?;
        Ok(FontRenderer {
            font,
            scale: PxScale::from(WATERMARK_FONT_PX),
        })
    }
}

impl TextRenderer for FontRenderer {
    fn measure_text_width(&self, text: &str) -> u32 {
        text_size(self.scale, &self.font, text).0
    }

    fn draw_text(&self, image: &mut RgbaImage, text: &str, x: i64, y: i64) {
        let (text_w, text_h) = text_size(self.scale, &self.font, text);
        if text_w == 0 || text_h == 0 {
            return;
        }

        // Rasterize onto a transparent overlay, scale its alpha down to the
        // watermark opacity, then composite. Drawing straight onto the image
        // would blend at full coverage strength instead.
        let mut overlay = RgbaImage::new(text_w, text_h);
        draw_text_mut(
            &mut overlay,
            Rgba([0, 0, 0, 255]),
            0,
            0,
            self.scale,
            &self.font,
            text,
        );
        for pixel in overlay.pixels_mut() {
            pixel[3] = (pixel[3] as u32 * WATERMARK_ALPHA as u32 / 255) as u8;
        }

        imageops::overlay(image, &overlay, x, y);
    }
}
