//! Snaptex Core Library
//!
//! Turns screenshots and image files into LaTeX with a remote vision model.
//!
//! # Overview
//!
//! The library handles:
//!
//! - **Monitors**: Virtual desktop geometry via [`monitors`]
//! - **Screen Capture**: Regions spanning several monitors via [`capture`]
//! - **Image Processing**: Normalization and encoding via [`image_processing`]
//! - **Conversion**: Background requests and result delivery via [`conversion`]
//! - **AI Integration**: The Gemini backend via [`gemini`]
//! - **User Interface**: Converter window and region selection via [`ui`]
//!
//! # Quick Start
//!
//! ```ignore
//! use snaptex_core::{ImageSource, ResultPane, Snaptex};
//!
//! snaptex_core::init();
//! let app = Snaptex::new();
//! let mut pane = ResultPane::default();
//! app.convert(ImageSource::File("formula.png".into()), &mut pane)?;
//! ```

pub mod capture;
pub mod config;
pub mod conversion;
pub mod error;
pub mod gemini;
pub mod image_processing;
pub mod monitors;
pub mod settings;
pub mod ui;

pub use capture::{ScreenCapturer, ScreenGrabber};
pub use config::{Config, ConfigSource, EnvConfig, LayeredConfig};
pub use conversion::{ConversionResult, ConversionView, Coordinator, ImageSource};
pub use error::{AppError, Result};
pub use gemini::GeminiClient;
pub use monitors::{CaptureRegion, Monitor, MonitorLayout, Point, Rect};
pub use settings::Settings;
pub use ui::ResultPane;

use image::DynamicImage;
use std::collections::HashMap;
use std::time::Duration;

/// Longest a blocking conversion may take.
pub const CONVERT_TIMEOUT: Duration = Duration::from_secs(180);

/// Entry point tying settings, capture and conversion together.
///
/// Configuration is resolved in layers: explicit overrides first, then the
/// saved settings file, then the environment.
pub struct Snaptex {
    settings: Settings,
    overrides: HashMap<String, String>,
}

impl Snaptex {
    /// Uses the settings saved on disk.
    pub fn new() -> Self {
        Self::with_settings(Settings::load())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            overrides: HashMap::new(),
        }
    }

    /// Overrides the model for this instance only.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.overrides.insert(config::MODEL.to_string(), model.into());
        self
    }

    /// The layered configuration used for new clients.
    pub fn config_source(&self) -> LayeredConfig {
        LayeredConfig::new()
            .with_layer(self.overrides.clone())
            .with_layer(self.settings.clone())
            .with_layer(EnvConfig)
    }

    /// Detects the connected monitors.
    ///
    /// # Errors
    ///
    /// Returns an error if the display server cannot be queried.
    pub fn list_monitors(&self) -> Result<Vec<Monitor>> {
        Ok(MonitorLayout::detect()?.monitors().to_vec())
    }

    /// Opens the converter window and blocks until it is closed.
    pub fn run_app(self) -> Result<()> {
        ui::run_app(self.settings, self.overrides)
    }

    /// Grabs a region of the virtual desktop.
    pub fn capture_region(&self, region: CaptureRegion) -> Result<DynamicImage> {
        ScreenCapturer::new().grab(region)
    }

    /// Converts one image and reports to `view`, blocking until done.
    ///
    /// # Errors
    ///
    /// Returns an error only if no result arrives within [`CONVERT_TIMEOUT`].
    /// Conversion failures are delivered to the view like any other result.
    pub fn convert(&self, source: ImageSource, view: &mut dyn ConversionView) -> Result<()> {
        let mut coordinator = Coordinator::gemini(&self.config_source());
        coordinator.submit(source, view);
        if coordinator.wait(view, CONVERT_TIMEOUT) {
            Ok(())
        } else {
            view.hide_progress();
            Err(AppError::remote(format!(
                "no response within {} seconds",
                CONVERT_TIMEOUT.as_secs()
            )))
        }
    }
}

impl Default for Snaptex {
    fn default() -> Self {
        Self::new()
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup. It loads a `.env` file if present.
pub fn init() {
    let _ = dotenvy::dotenv();
}
