use crate::config::Config;
use crate::conversion::{ConversionRequest, RemoteModel};
use crate::error::{AppError, Result};
use gemini_rust::{Blob, Content, Gemini, Message, Part, Role};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Remote model backed by the Gemini API.
pub struct GeminiClient {
    client: Gemini,
    model_name: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        // Explicit base URL avoids a BadScheme error from the default builder
        let base_url = url::Url::parse(BASE_URL)
            .map_err(|e| AppError::config(format!("Invalid base URL: {}", e)))?;

        let model_name = if config.model_name.starts_with("models/") {
            config.model_name.clone()
        } else {
            format!("models/{}", config.model_name)
        };
        let model_url = format!("{}{}", BASE_URL, model_name);

        let client = Gemini::with_model_and_base_url(&config.api_key, model_url, base_url)
            .map_err(|e| AppError::config(format!("Failed to create Gemini client: {}", e)))?;

        Ok(Self {
            client,
            model_name: config.model_name.clone(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl RemoteModel for GeminiClient {
    async fn complete(&self, request: ConversionRequest) -> Result<String> {
        if request.model_id != self.model_name {
            log::warn!(
                "Request names model {} but client is bound to {}",
                request.model_id,
                self.model_name
            );
        }

        let image_part = Part::InlineData {
            inline_data: Blob {
                mime_type: request.mime_type.to_string(),
                data: request.image_base64,
            },
        };

        let text_part = Part::Text {
            text: request.instruction.to_string(),
            thought: None,
            thought_signature: None,
        };

        let message = Message {
            role: Role::User,
            content: Content {
                role: Some(Role::User),
                parts: Some(vec![text_part, image_part]),
            },
        };

        let response = self
            .client
            .generate_content()
            .with_messages(vec![message])
            .with_temperature(request.temperature)
            .execute()
            .await
            .map_err(|e| AppError::remote(format!("API request failed: {:?}", e)))?;

        // Thought parts are reasoning traces, not output.
        let text = response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.parts.as_ref())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| match part {
                        Part::Text { text, thought, .. } if !thought.unwrap_or(false) => {
                            Some(text.as_str())
                        }
                        _ => None,
                    })
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::remote("No text response received from Gemini"));
        }

        Ok(text)
    }
}
