//! UI state types.

use super::overlay::EguiSurface;
use super::selector::{RegionSelector, SelectionOutcome, SelectorEvent, Surface};
use crate::capture::{capture_then_restore, ScreenGrabber};
use crate::conversion::{ConversionResult, ConversionView};
use crate::error::Result;
use crate::monitors::{CaptureRegion, Rect};
use image::{DynamicImage, RgbaImage};
use std::time::{Duration, Instant};

/// Pause between hiding the main window and grabbing pixels, so the
/// compositor has removed it and the overlays from the screen.
pub const CAPTURE_DELAY: Duration = Duration::from_millis(300);

/// What the main window shows about the current conversion.
#[derive(Debug, Default)]
pub struct ResultPane {
    pending_preview: Option<RgbaImage>,
    busy: bool,
    text: String,
    is_error: bool,
}

impl ResultPane {
    /// Thumbnail waiting to be uploaded as a texture.
    pub fn take_preview(&mut self) -> Option<RgbaImage> {
        self.pending_preview.take()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// Shows a message that did not come from a conversion.
    pub fn show_error(&mut self, message: impl std::fmt::Display) {
        self.text = format!("Error: {}", message);
        self.is_error = true;
    }
}

impl ConversionView for ResultPane {
    fn show_preview(&mut self, thumbnail: RgbaImage) {
        self.pending_preview = Some(thumbnail);
    }

    fn show_progress(&mut self) {
        self.busy = true;
    }

    fn hide_progress(&mut self) {
        self.busy = false;
    }

    fn show_result(&mut self, result: &ConversionResult) {
        self.text = result.display_text();
        self.is_error = result.is_failure();
    }
}

/// The converter window, as far as a capture is concerned.
pub trait MainWindow {
    fn hide(&self);
    fn restore(&self);
}

/// Where the selection overlays go: the virtual desktop in pixels, and the
/// factor that turns those pixels into window points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayPlacement {
    pub desktop: Rect,
    pub scale: f32,
}

/// Progress of an on-screen capture.
///
/// `Idle` -> `Selecting` (overlays up, main window hidden) -> `Waiting`
/// (overlays gone, delay running) -> `Idle` (pixels grabbed, window back).
pub enum CaptureFlow<S: Surface = EguiSurface> {
    Idle,
    Selecting {
        selector: RegionSelector<S>,
        placement: OverlayPlacement,
    },
    Waiting {
        region: CaptureRegion,
        due: Instant,
    },
}

impl<S: Surface> CaptureFlow<S> {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Opens the selector and hides the main window behind it.
///
/// # Errors
///
/// If the selector cannot be opened the window is restored and the error
/// returned.
pub fn start_selection<S, F>(open: F, window: &dyn MainWindow) -> Result<CaptureFlow<S>>
where
    S: Surface,
    F: FnOnce() -> Result<(RegionSelector<S>, OverlayPlacement)>,
{
    match open() {
        Ok((selector, placement)) => {
            window.hide();
            Ok(CaptureFlow::Selecting { selector, placement })
        }
        Err(e) => {
            window.restore();
            Err(e)
        }
    }
}

/// Feeds one frame of input to an open selector.
///
/// Stays in `Selecting` until the selector finishes. A finished selection
/// that leads to no capture restores the main window right away.
pub fn drive_selection<S: Surface>(
    mut selector: RegionSelector<S>,
    placement: OverlayPlacement,
    events: Vec<SelectorEvent>,
    now: Instant,
    window: &dyn MainWindow,
) -> CaptureFlow<S> {
    let Some(outcome) = events.into_iter().find_map(|event| selector.handle(event)) else {
        return CaptureFlow::Selecting { selector, placement };
    };

    drop(selector);
    let next = after_selection(outcome, now);
    if next.is_idle() {
        window.restore();
    }
    next
}

/// Grabs `region` and restores the main window whatever the outcome.
pub fn capture_behind_window<G>(
    grabber: &G,
    region: CaptureRegion,
    window: &dyn MainWindow,
) -> Result<DynamicImage>
where
    G: ScreenGrabber + ?Sized,
{
    capture_then_restore(grabber, region, || window.restore())
}

/// Next step once the selector has finished.
///
/// Only a non-empty region leads to a capture. For anything else the flow
/// returns to idle and the caller brings the main window back.
pub fn after_selection<S: Surface>(outcome: SelectionOutcome, now: Instant) -> CaptureFlow<S> {
    match outcome {
        SelectionOutcome::Completed(region) if !region.is_empty() => CaptureFlow::Waiting {
            region,
            due: now + CAPTURE_DELAY,
        },
        SelectionOutcome::Completed(region) => {
            log::debug!("Ignoring empty selection {}", region);
            CaptureFlow::Idle
        }
        SelectionOutcome::Cancelled => CaptureFlow::Idle,
    }
}
