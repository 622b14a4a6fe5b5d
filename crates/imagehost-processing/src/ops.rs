//! Transformation operations and their parameter validation.
//!
//! External input arrives as a kind string plus a loosely-typed parameter
//! bag; both are folded into the exhaustively-matched [`TransformOp`] enum
//! up front, so the pipeline itself never sees an invalid operation.

use crate::encode::TargetFormat;
use imagehost_core::AppError;
use serde::{Deserialize, Serialize};

/// Raw transformation parameters as supplied by a caller.
///
/// Field relevance depends on the operation kind; validation happens in
/// [`TransformOp::from_request`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformParams {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub watermark_text: Option<String>,
    pub watermark_position: Option<String>,
    pub quality: Option<u32>,
    pub format: Option<String>,
}

/// Watermark anchor on the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl WatermarkPosition {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.to_lowercase().as_str() {
            "topleft" => Ok(WatermarkPosition::TopLeft),
            "topright" => Ok(WatermarkPosition::TopRight),
            "bottomleft" => Ok(WatermarkPosition::BottomLeft),
            "bottomright" => Ok(WatermarkPosition::BottomRight),
            "center" => Ok(WatermarkPosition::Center),
            _ => Err(AppError::Param(format!(
                "Unsupported watermark position: {}",
                s
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WatermarkPosition::TopLeft => "topleft",
            WatermarkPosition::TopRight => "topright",
            WatermarkPosition::BottomLeft => "bottomleft",
            WatermarkPosition::BottomRight => "bottomright",
            WatermarkPosition::Center => "center",
        }
    }
}

/// A validated transformation request.
///
/// Construction goes through the smart constructors below; every value held
/// here already satisfies the operation's invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOp {
    Resize {
        width: Option<u32>,
        height: Option<u32>,
    },
    Crop {
        width: u32,
        height: u32,
    },
    Watermark {
        text: String,
        position: WatermarkPosition,
    },
    Compress {
        quality: u8,
    },
    Format {
        target: TargetFormat,
    },
}

impl TransformOp {
    /// Dispatch on a caller-supplied operation kind (case-insensitive).
    pub fn from_request(kind: &str, params: &TransformParams) -> Result<Self, AppError> {
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(AppError::Param(
                "Operation kind must not be empty".to_string(),
            ));
        }

        match kind.to_lowercase().as_str() {
            "resize" => Self::resize(params.width, params.height),
            "crop" => Self::crop(params.width, params.height),
            "watermark" => Self::watermark(
                params.watermark_text.as_deref(),
                params.watermark_position.as_deref(),
            ),
            "compress" => Self::compress(params.quality),
            "format" => Self::convert_format(params.format.as_deref()),
            other => Err(AppError::Param(format!(
                "Unsupported operation kind: {}",
                other
            ))),
        }
    }

    pub fn resize(width: Option<u32>, height: Option<u32>) -> Result<Self, AppError> {
        if width.is_none() && height.is_none() {
            return Err(AppError::Param(
                "Resize requires at least one of width or height".to_string(),
            ));
        }
        if width == Some(0) || height == Some(0) {
            return Err(AppError::Param(
                "Resize dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(TransformOp::Resize { width, height })
    }

    pub fn crop(width: Option<u32>, height: Option<u32>) -> Result<Self, AppError> {
        match (width, height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Ok(TransformOp::Crop {
                width: w,
                height: h,
            }),
            (Some(_), Some(_)) => Err(AppError::Param(
                "Crop dimensions must be greater than zero".to_string(),
            )),
            _ => Err(AppError::Param(
                "Crop requires both width and height".to_string(),
            )),
        }
    }

    pub fn watermark(text: Option<&str>, position: Option<&str>) -> Result<Self, AppError> {
        let text = text.unwrap_or("").trim();
        if text.is_empty() {
            return Err(AppError::Param(
                "Watermark text must not be blank".to_string(),
            ));
        }
        let position = match position {
            Some(p) if !p.trim().is_empty() => WatermarkPosition::parse(p)?,
            _ => WatermarkPosition::BottomRight,
        };
        Ok(TransformOp::Watermark {
            text: text.to_string(),
            position,
        })
    }

    pub fn compress(quality: Option<u32>) -> Result<Self, AppError> {
        match quality {
            Some(q) if (1..=100).contains(&q) => Ok(TransformOp::Compress { quality: q as u8 }),
            Some(q) => Err(AppError::Param(format!(
                "Quality must be between 1 and 100, got {}",
                q
            ))),
            None => Err(AppError::Param("Compress requires a quality".to_string())),
        }
    }

    pub fn convert_format(format: Option<&str>) -> Result<Self, AppError> {
        let format = format.unwrap_or("").trim();
        if format.is_empty() {
            return Err(AppError::Param(
                "Target format must not be empty".to_string(),
            ));
        }
        Ok(TransformOp::Format {
            target: TargetFormat::parse(format)?,
        })
    }

    /// Operation bucket used for destination directories.
    pub fn kind(&self) -> &'static str {
        match self {
            TransformOp::Resize { .. } => "resize",
            TransformOp::Crop { .. } => "crop",
            TransformOp::Watermark { .. } => "watermark",
            TransformOp::Compress { .. } => "compress",
            TransformOp::Format { .. } => "format",
        }
    }

    /// Cache key for the fully resolved parameter tuple.
    ///
    /// An absent resize dimension is normalized to `auto` so that
    /// `resize(800, None)` and `resize(800, Some(600))` never collide.
    pub fn fingerprint(&self, image_id: i64) -> String {
        fn dim(v: Option<u32>) -> String {
            v.map_or_else(|| "auto".to_string(), |n| n.to_string())
        }

        match self {
            TransformOp::Resize { width, height } => {
                format!("resize:{}:{}:{}", image_id, dim(*width), dim(*height))
            }
            TransformOp::Crop { width, height } => {
                format!("crop:{}:{}:{}", image_id, width, height)
            }
            TransformOp::Watermark { text, position } => {
                format!("watermark:{}:{}:{}", image_id, text, position.as_str())
            }
            TransformOp::Compress { quality } => format!("compress:{}:{}", image_id, quality),
            TransformOp::Format { target } => {
                format!("format:{}:{}", image_id, target.extension())
            }
        }
    }

    /// Filename tag encoding the operation parameters, e.g. `resize_800x600`.
    /// Format conversion carries no tag; its output name is just the new
    /// extension on the source's base name.
    pub fn tag(&self) -> Option<String> {
        fn dim(v: Option<u32>) -> String {
            v.map_or_else(|| "auto".to_string(), |n| n.to_string())
        }

        match self {
            TransformOp::Resize { width, height } => {
                Some(format!("resize_{}x{}", dim(*width), dim(*height)))
            }
            TransformOp::Crop { width, height } => Some(format!("crop_{}x{}", width, height)),
            TransformOp::Watermark { .. } => Some("watermark".to_string()),
            TransformOp::Compress { quality } => Some(format!("compress_{}", quality)),
            TransformOp::Format { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_is_case_insensitive() {
        let params = TransformParams {
            width: Some(800),
            ..Default::default()
        };
        let op = TransformOp::from_request("ReSiZe", &params).unwrap();
        assert_eq!(
            op,
            TransformOp::Resize {
                width: Some(800),
                height: None
            }
        );
    }

    #[test]
    fn test_empty_kind_rejected() {
        let err = TransformOp::from_request("  ", &TransformParams::default()).unwrap_err();
        assert!(matches!(err, AppError::Param(_)));
    }

    #[test]
    fn test_unknown_kind_named_in_error() {
        let err = TransformOp::from_request("rotate", &TransformParams::default()).unwrap_err();
        assert!(err.to_string().contains("rotate"));
    }

    #[test]
    fn test_resize_requires_a_dimension() {
        assert!(TransformOp::resize(None, None).is_err());
        assert!(TransformOp::resize(Some(0), Some(10)).is_err());
        assert!(TransformOp::resize(Some(100), None).is_ok());
        assert!(TransformOp::resize(None, Some(100)).is_ok());
    }

    #[test]
    fn test_crop_requires_both_dimensions() {
        assert!(TransformOp::crop(Some(100), None).is_err());
        assert!(TransformOp::crop(None, Some(100)).is_err());
        assert!(TransformOp::crop(Some(100), Some(100)).is_ok());
    }

    #[test]
    fn test_watermark_blank_text_rejected() {
        assert!(TransformOp::watermark(None, None).is_err());
        assert!(TransformOp::watermark(Some("   "), None).is_err());
    }

    #[test]
    fn test_watermark_defaults_to_bottom_right() {
        let op = TransformOp::watermark(Some("hello"), None).unwrap();
        assert_eq!(
            op,
            TransformOp::Watermark {
                text: "hello".to_string(),
                position: WatermarkPosition::BottomRight
            }
        );
    }

    #[test]
    fn test_watermark_unknown_position_rejected() {
        let err = TransformOp::watermark(Some("hello"), Some("middle")).unwrap_err();
        assert!(err.to_string().contains("middle"));
    }

    #[test]
    fn test_compress_quality_bounds() {
        assert!(TransformOp::compress(None).is_err());
        assert!(TransformOp::compress(Some(0)).is_err());
        assert!(TransformOp::compress(Some(101)).is_err());
        assert!(TransformOp::compress(Some(1)).is_ok());
        assert!(TransformOp::compress(Some(100)).is_ok());
    }

    #[test]
    fn test_format_whitelist() {
        assert!(TransformOp::convert_format(Some("WEBP")).is_ok());
        assert!(TransformOp::convert_format(Some("bmp")).is_err());
        assert!(TransformOp::convert_format(None).is_err());
    }

    #[test]
    fn test_fingerprint_normalizes_missing_dimension() {
        let op = TransformOp::resize(Some(800), None).unwrap();
        assert_eq!(op.fingerprint(7), "resize:7:800:auto");

        let op = TransformOp::resize(Some(800), Some(600)).unwrap();
        assert_eq!(op.fingerprint(7), "resize:7:800:600");
    }

    #[test]
    fn test_fingerprint_includes_watermark_params() {
        let op = TransformOp::watermark(Some("(c) acme"), Some("center")).unwrap();
        assert_eq!(op.fingerprint(3), "watermark:3:(c) acme:center");
    }

    #[test]
    fn test_tag_encoding() {
        assert_eq!(
            TransformOp::resize(Some(800), Some(600)).unwrap().tag(),
            Some("resize_800x600".to_string())
        );
        assert_eq!(
            TransformOp::compress(Some(75)).unwrap().tag(),
            Some("compress_75".to_string())
        );
        assert_eq!(TransformOp::convert_format(Some("png")).unwrap().tag(), None);
    }

    #[test]
    fn test_params_deserialize() {
        let params: TransformParams =
            serde_json::from_str(r#"{"width": 800, "quality": 75}"#).unwrap();
        assert_eq!(params.width, Some(800));
        assert_eq!(params.quality, Some(75));
        assert_eq!(params.height, None);
    }
}
