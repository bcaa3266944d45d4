//! Screen capture of virtual-desktop regions.
//!
//! A selected region may straddle monitors with different origins and
//! scale factors. [`ScreenCapturer`] splits the region per monitor, grabs
//! each piece in that monitor's local coordinates and stitches the pieces
//! back together.
//!
//! # Example
//!
//! ```ignore
//! use snaptex_core::capture::{ScreenCapturer, ScreenGrabber};
//! use snaptex_core::monitors::Rect;
//!
//! let capturer = ScreenCapturer::new();
//! let image = capturer.grab(Rect::new(-200, 100, 640, 480))?;
//! ```

use crate::error::{AppError, Result};
use crate::monitors::{CaptureRegion, Monitor, MonitorLayout, Rect};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use screenshots::Screen;

/// Something that can turn a desktop rectangle into pixels.
pub trait ScreenGrabber {
    fn grab(&self, region: CaptureRegion) -> Result<DynamicImage>;
}

/// The part of a capture region that falls on one monitor.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturePiece {
    pub monitor: Monitor,
    /// Overlap in virtual-desktop coordinates.
    pub area: Rect,
}

impl CapturePiece {
    /// Overlap relative to the monitor's own origin.
    pub fn local_area(&self) -> Rect {
        Rect::new(
            self.area.x - self.monitor.origin.x,
            self.area.y - self.monitor.origin.y,
            self.area.width,
            self.area.height,
        )
    }
}

/// Splits `region` into per-monitor pieces.
///
/// # Errors
///
/// Returns [`AppError::Capture`] for zero-area regions and for regions that
/// touch no monitor.
pub fn plan_capture(region: CaptureRegion, layout: &MonitorLayout) -> Result<Vec<CapturePiece>> {
    if region.is_empty() {
        return Err(AppError::capture(format!("region {} has no area", region)));
    }

    let pieces = layout
        .monitors()
        .iter()
        .filter_map(|monitor| {
            region.intersect(&monitor.bounds()).map(|area| CapturePiece {
                monitor: monitor.clone(),
                area,
            })
        })
        .collect::<Vec<_>>();

    if pieces.is_empty() {
        return Err(AppError::capture(format!(
            "region {} is outside every monitor",
            region
        )));
    }

    Ok(pieces)
}

/// Screen capturer backed by the `screenshots` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScreenCapturer;

impl ScreenCapturer {
    pub fn new() -> Self {
        Self
    }

    fn capture_piece(screen: &Screen, piece: &CapturePiece) -> Result<RgbaImage> {
        let local = piece.local_area();
        let captured = screen
            .capture_area(local.x, local.y, local.width, local.height)
            .map_err(|e| AppError::capture(format!("Failed to capture region: {}", e)))?;

        // screenshots links its own image version; hop over via the raw buffer.
        let width = captured.width();
        let height = captured.height();
        let rgba_data = captured.into_raw();

        image::ImageBuffer::from_raw(width, height, rgba_data)
            .ok_or_else(|| AppError::capture("Failed to create image buffer"))
    }
}

impl ScreenGrabber for ScreenCapturer {
    fn grab(&self, region: CaptureRegion) -> Result<DynamicImage> {
        let layout = MonitorLayout::detect()?;
        let pieces = plan_capture(region, &layout)?;
        let screens = Screen::all()
            .map_err(|e| AppError::capture(format!("Failed to enumerate screens: {}", e)))?;

        let mut captured = Vec::with_capacity(pieces.len());
        for piece in &pieces {
            let screen = screens
                .iter()
                .find(|s| s.display_info.id == piece.monitor.id)
                .ok_or_else(|| {
                    AppError::capture(format!("Monitor {} disappeared", piece.monitor.id))
                })?;
            captured.push((piece, Self::capture_piece(screen, piece)?));
        }

        if let [(_, image)] = captured.as_slice() {
            return Ok(DynamicImage::ImageRgba8(image.clone()));
        }

        // Stitch at the densest pixel scale so no piece loses detail.
        let scale = captured
            .iter()
            .map(|(piece, image)| image.width() as f32 / piece.area.width as f32)
            .fold(1.0_f32, f32::max);
        let scaled = |v: u32| ((v as f32 * scale).round() as u32).max(1);

        let mut canvas = RgbaImage::new(scaled(region.width), scaled(region.height));
        for (piece, image) in captured {
            let (w, h) = (scaled(piece.area.width), scaled(piece.area.height));
            let image = if image.dimensions() == (w, h) {
                image
            } else {
                imageops::resize(&image, w, h, FilterType::Lanczos3)
            };
            let dx = ((piece.area.x - region.x) as f32 * scale).round() as i64;
            let dy = ((piece.area.y - region.y) as f32 * scale).round() as i64;
            imageops::overlay(&mut canvas, &image, dx, dy);
        }

        log::info!(
            "Captured {} from {} monitor(s) at scale {}",
            region,
            pieces.len(),
            scale
        );
        Ok(DynamicImage::ImageRgba8(canvas))
    }
}

/// Runs a closure when dropped.
///
/// Used to bring the main window back after a capture whatever happens in
/// between.
pub struct RestoreGuard<F: FnOnce()> {
    restore: Option<F>,
}

impl<F: FnOnce()> RestoreGuard<F> {
    pub fn new(restore: F) -> Self {
        Self {
            restore: Some(restore),
        }
    }
}

impl<F: FnOnce()> Drop for RestoreGuard<F> {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            restore();
        }
    }
}

/// Grabs `region` and calls `restore` afterwards, on success, error or panic.
pub fn capture_then_restore<G, F>(grabber: &G, region: CaptureRegion, restore: F) -> Result<DynamicImage>
where
    G: ScreenGrabber + ?Sized,
    F: FnOnce(),
{
    let _guard = RestoreGuard::new(restore);
    grabber.grab(region)
}
