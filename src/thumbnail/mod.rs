//! Thumbnail rendering
//!
//! Turns a full-page raster into a fixed-size JPEG preview: the source is
//! scaled to fit inside the box with its aspect ratio preserved, centered,
//! and the remaining area is padded with white.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use thiserror::Error;

/// Padding color around the scaled image
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Errors raised while building a thumbnail
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Failed to decode raster: {0}")]
    Decode(String),

    #[error("Failed to encode thumbnail: {0}")]
    Encode(String),

    #[error("Thumbnail box must be at least 1x1, got {width}x{height}")]
    InvalidBox { width: u32, height: u32 },
}

/// Box dimensions and encoding quality for thumbnails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSpec {
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

impl From<&crate::config::ThumbnailConfig> for ThumbnailSpec {
    fn from(config: &crate::config::ThumbnailConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            quality: config.quality,
        }
    }
}

/// Renders a JPEG thumbnail of `raster` that is exactly `spec.width` x `spec.height`
///
/// Deterministic: the same input bytes and spec always produce the same output.
pub fn thumbnail(raster: &[u8], spec: ThumbnailSpec) -> Result<Vec<u8>, ThumbnailError> {
    if spec.width == 0 || spec.height == 0 {
        return Err(ThumbnailError::InvalidBox {
            width: spec.width,
            height: spec.height,
        });
    }

    let source = image::load_from_memory(raster)
        .map_err(|e| ThumbnailError::Decode(e.to_string()))?
        .to_rgb8();

    let (width, height) = fit_within(source.dimensions(), (spec.width, spec.height));
    let scaled = imageops::resize(&source, width, height, FilterType::Triangle);

    let mut canvas = RgbImage::from_pixel(spec.width, spec.height, BACKGROUND);
    let x = (spec.width - width) / 2;
    let y = (spec.height - height) / 2;
    imageops::overlay(&mut canvas, &scaled, i64::from(x), i64::from(y));

    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, spec.quality.clamp(1, 100));
    encoder
        .encode_image(&canvas)
        .map_err(|e| ThumbnailError::Encode(e.to_string()))?;

    Ok(bytes)
}

/// Largest size with the source's aspect ratio that fits in the box
fn fit_within(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = (u64::from(source.0.max(1)), u64::from(source.1.max(1)));
    let (tw, th) = (u64::from(target.0), u64::from(target.1));

    // Compare sw/sh against tw/th without floating point.
    if sw * th >= sh * tw {
        let height = (sh * tw / sw).max(1);
        (target.0, height as u32)
    } else {
        let width = (sw * th / sh).max(1);
        (width as u32, target.1)
    }
}
