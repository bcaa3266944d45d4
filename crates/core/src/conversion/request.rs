//! The request/response boundary with the remote model.

use crate::error::{AppError, Result};
use crate::image_processing::{NormalizedImage, PNG_MIME};
use std::future::Future;

/// Instruction sent alongside every image.
pub const INSTRUCTION: &str = "\
Convert the formula in this image to LaTeX, keeping it exactly as written. Output LaTeX code only:
1. Preserve the original layout and structure of the formula completely
2. Do not add any code block markers (such as ```)
3. Keep the original environments (such as equation/align)
4. Output pure LaTeX without any comments or explanations
5. Make sure the result can be pasted straight into a LaTeX editor";

/// Sampling temperature; zero keeps repeated conversions stable.
pub const TEMPERATURE: f32 = 0.0;

/// Everything the remote model needs for one conversion.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionRequest {
    pub model_id: String,
    pub instruction: &'static str,
    /// Base64 of the encoded image.
    pub image_base64: String,
    pub mime_type: &'static str,
    pub temperature: f32,
}

impl ConversionRequest {
    /// Encodes `image` and wraps it with the fixed instruction.
    pub fn new(model_id: impl Into<String>, image: &NormalizedImage) -> Result<Self> {
        Ok(Self::from_encoded(model_id, image.to_base64_png()?))
    }

    /// Wraps an already Base64-encoded PNG.
    pub fn from_encoded(model_id: impl Into<String>, image_base64: String) -> Self {
        Self {
            model_id: model_id.into(),
            instruction: INSTRUCTION,
            image_base64,
            mime_type: PNG_MIME,
            temperature: TEMPERATURE,
        }
    }
}

/// A vision model that turns an image plus instruction into text.
pub trait RemoteModel: Send + Sync + 'static {
    fn complete(&self, request: ConversionRequest) -> impl Future<Output = Result<String>> + Send;
}

/// The outcome delivered to the interactive thread for one request.
#[derive(Debug)]
pub enum ConversionResult {
    /// LaTeX returned by the model, trimmed of surrounding whitespace.
    Text(String),
    Failure(AppError),
}

impl ConversionResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// The text shown in the result area.
    pub fn display_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Failure(e) => format!("Error: {}", e),
        }
    }
}

impl From<Result<String>> for ConversionResult {
    fn from(result: Result<String>) -> Self {
        match result {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Failure(e),
        }
    }
}
