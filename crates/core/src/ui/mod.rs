//! Desktop interface.
//!
//! The UI is split into focused submodules:
//! - [`selector`]: region selection state machine over abstract surfaces
//! - [`overlay`]: egui viewports implementing those surfaces
//! - [`selection`]: translating egui input into selector events
//! - [`rendering`]: drawing utilities for overlays and borders
//! - [`state`]: result pane and capture flow
//! - [`app`]: the main converter window

mod app;
mod overlay;
mod rendering;
mod selection;
pub mod selector;
mod state;

pub use app::ConverterApp;
pub use overlay::EguiSurface;
pub use selector::{
    RectStyle, RegionSelector, SelectionOutcome, SelectorEvent, SelectorState, Surface,
};
pub use state::{ResultPane, CAPTURE_DELAY};

use crate::error::{AppError, Result};
use crate::settings::Settings;
use eframe::egui;
use std::collections::HashMap;

/// Opens the converter window and blocks until it is closed.
///
/// `overrides` take precedence over `settings`, which take precedence over
/// the environment.
pub fn run_app(settings: Settings, overrides: HashMap<String, String>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Image to LaTeX")
            .with_inner_size([900.0, 600.0])
            .with_resizable(false),
        ..Default::default()
    };

    eframe::run_native(
        "Image to LaTeX",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(ConverterApp::new(settings, overrides)) as Box<dyn eframe::App>)
        }),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))
}
