//! Image normalization and encoding.
//!
//! Every image sent to the remote model goes through [`normalize`] first:
//! it is coerced to RGB, scaled so the long edge fits 2048 px and the short
//! edge fits 1024 px, and sharpened to undo the softening introduced by
//! resampling and by screenshots or photos in general.
//!
//! The transform is a pure function of the pixels. Small inputs are
//! enlarged on purpose so the model gets enough resolution to read
//! subscripts and fine symbols.

use crate::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Upper bound for the longer edge after normalization.
pub const LONG_EDGE_LIMIT: u32 = 2048;
/// Upper bound for the shorter edge after normalization.
pub const SHORT_EDGE_LIMIT: u32 = 1024;
/// Bounding box of the cosmetic preview thumbnail.
pub const PREVIEW_SIZE: u32 = 400;

/// MIME type of [`NormalizedImage::to_base64_png`] output.
pub const PNG_MIME: &str = "image/png";

/// Unsharp-mask parameters, in the usual radius / percent / threshold form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnsharpMask {
    /// Gaussian blur sigma in pixels.
    pub radius: f32,
    /// How much of the difference to add back, in percent.
    pub percent: u32,
    /// Per-channel differences below this are left alone.
    pub threshold: u8,
}

/// Sharpening applied after resampling.
pub const SHARPEN: UnsharpMask = UnsharpMask {
    radius: 1.5,
    percent: 200,
    threshold: 2,
};

/// An RGB image whose edges fit within [`LONG_EDGE_LIMIT`] / [`SHORT_EDGE_LIMIT`].
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedImage {
    pixels: RgbImage,
}

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Encodes the image as PNG and returns it as a Base64 string.
    pub fn to_base64_png(&self) -> Result<String> {
        let mut buffer: Vec<u8> = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        self.pixels
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| AppError::encode(format!("Failed to encode PNG: {}", e)))?;

        Ok(BASE64.encode(buffer))
    }
}

/// Decodes an in-memory image, guessing the format from its contents.
///
/// # Errors
///
/// Returns [`AppError::ImageDecode`] for unknown formats or corrupt data.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| AppError::decode(e.to_string()))
}

/// Opens and decodes an image file.
///
/// # Errors
///
/// Returns [`AppError::ImageDecode`] if the file is missing, unreadable or
/// not a supported image.
pub fn open(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| AppError::decode(format!("{}: {}", path.display(), e)))
}

/// Computes the normalized size for an image of `width` x `height`.
///
/// Landscape images are fitted to `2048 x 1024`, portrait and square ones
/// to `1024 x 2048`. Results are rounded and never below one pixel.
pub fn target_size(width: u32, height: u32) -> (u32, u32) {
    let (w, h) = (width as f64, height as f64);
    let (long, short) = (LONG_EDGE_LIMIT as f64, SHORT_EDGE_LIMIT as f64);

    let ratio = if width > height {
        (long / w).min(short / h)
    } else {
        (short / w).min(long / h)
    };

    let scaled = |edge: f64| ((edge * ratio).round() as u32).max(1);
    (scaled(w), scaled(h))
}

/// Produces the bounded, sharpened RGB image sent to the remote model.
///
/// # Errors
///
/// Returns [`AppError::ImageDecode`] when the source has no pixels.
pub fn normalize(source: &DynamicImage) -> Result<NormalizedImage> {
    if source.width() == 0 || source.height() == 0 {
        return Err(AppError::decode("image has no pixels"));
    }

    let rgb = source.to_rgb8();
    let (width, height) = target_size(rgb.width(), rgb.height());
    log::debug!(
        "Normalizing {}x{} -> {}x{}",
        rgb.width(),
        rgb.height(),
        width,
        height
    );

    let resized = if (width, height) == rgb.dimensions() {
        rgb
    } else {
        imageops::resize(&rgb, width, height, FilterType::Lanczos3)
    };

    Ok(NormalizedImage {
        pixels: unsharp_mask(&resized, SHARPEN),
    })
}

/// Sharpens by adding back the difference between the image and its blur.
pub fn unsharp_mask(image: &RgbImage, mask: UnsharpMask) -> RgbImage {
    let blurred = imageops::blur(image, mask.radius);
    let amount = mask.percent as i32;
    let threshold = mask.threshold as i32;

    let mut output = image.clone();
    for (out, soft) in output.pixels_mut().zip(blurred.pixels()) {
        for (channel, &blur) in out.0.iter_mut().zip(soft.0.iter()) {
            let original = *channel as i32;
            let diff = original - blur as i32;
            if diff.abs() >= threshold {
                *channel = (original + diff * amount / 100).clamp(0, 255) as u8;
            }
        }
    }
    output
}

/// Scales `image` down into the preview box, keeping the aspect ratio.
/// Images already inside the box are not enlarged.
pub fn thumbnail(image: &DynamicImage) -> RgbaImage {
    if image.width() <= PREVIEW_SIZE && image.height() <= PREVIEW_SIZE {
        return image.to_rgba8();
    }
    image.thumbnail(PREVIEW_SIZE, PREVIEW_SIZE).to_rgba8()
}
