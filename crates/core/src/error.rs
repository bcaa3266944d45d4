//! Error types for the snaptex-core library.
//!
//! Every failure that can reach the user is one of these variants. The
//! conversion coordinator turns them into an inline message instead of
//! letting them escape to the interactive thread.

use thiserror::Error;

/// Errors that can occur within the snaptex-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// The source image could not be read or decoded.
    #[error("Could not read image: {0}")]
    ImageDecode(String),

    /// A required setting (such as the API key) is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Grabbing pixels from the screen failed.
    #[error("Screen capture failed: {0}")]
    Capture(String),

    /// The remote model request failed or returned nothing usable.
    #[error("Remote model error: {0}")]
    Remote(String),

    /// Encoding the normalized image for transport failed.
    #[error("Image encoding failed: {0}")]
    ImageEncode(String),

    /// UI-related errors (window and surface management).
    #[error("UI error: {0}")]
    Ui(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates an image decode error with the given message.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::ImageDecode(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a screen capture error with the given message.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Creates a remote model error with the given message.
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Creates an image encoding error with the given message.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::ImageEncode(msg.into())
    }

    /// Creates a UI error with the given message.
    pub fn ui(msg: impl Into<String>) -> Self {
        Self::Ui(msg.into())
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
