//! Gemini (Google) image model client.

use crate::config::Config;
use crate::error::{parse_retry_after, sanitize_error_message, CulinaryError, Result};
use crate::photo::model::{Candidate, ImageModel, InlineData, ModelResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Gemini endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini image model variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GeminiModel {
    /// Gemini 2.5 Flash Image (fast, economical).
    #[default]
    FlashImage,
    /// Gemini 3 Pro Image (highest quality).
    ProImage,
    /// Any other model identifier.
    Custom(String),
}

impl GeminiModel {
    /// Returns the API model identifier.
    pub fn as_str(&self) -> &str {
        match self {
            Self::FlashImage => "gemini-2.5-flash-image",
            Self::ProImage => "gemini-3-pro-image-preview",
            Self::Custom(name) => name,
        }
    }

    /// Maps an identifier to a known variant, else [`GeminiModel::Custom`].
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "gemini-2.5-flash-image" => Self::FlashImage,
            "gemini-3-pro-image-preview" => Self::ProImage,
            other => Self::Custom(other.to_string()),
        }
    }
}

/// Builder for [`GeminiClient`].
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    api_key: Option<String>,
    model: GeminiModel,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the builder from resolved configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_key: Some(config.api_key.clone()),
            model: GeminiModel::from_name(&config.model),
            base_url: Some(config.base_url.clone()),
            timeout: config.timeout,
        }
    }

    /// Sets the API key. Falls back to the environment (see [`Config`]).
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the Gemini model variant.
    pub fn model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Overrides the API base URL (tests, proxies).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets an HTTP timeout. None by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<GeminiClient> {
        let api_key = match self.api_key {
            Some(key) => key,
            None => crate::config::api_key_from_env()?,
        };

        let mut http = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(GeminiClient {
            client: http.build()?,
            api_key,
            model: self.model,
            base_url,
        })
    }
}

/// Gemini `generateContent` client implementing [`ImageModel`].
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: GeminiModel,
    base_url: String,
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            self.model.as_str(),
        )
    }

    fn parse_error(
        &self,
        status: u16,
        text: &str,
        headers: &reqwest::header::HeaderMap,
    ) -> CulinaryError {
        let text = sanitize_error_message(text);
        if status == 404 {
            return CulinaryError::Api {
                status,
                message: format!(
                    "Model '{}' not found. Verify the model name is correct.",
                    self.model.as_str()
                ),
            };
        }
        if status == 429 {
            let retry_after = parse_retry_after(headers).map(Duration::from_secs);
            return CulinaryError::RateLimited { retry_after };
        }
        if status == 401 || status == 403 {
            return CulinaryError::Auth(text);
        }
        let lower = text.to_lowercase();
        if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
            return CulinaryError::ContentBlocked(text);
        }
        CulinaryError::Api {
            status,
            message: text,
        }
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ImageModel for GeminiClient {
    async fn send_image_and_prompt(
        &self,
        image: &InlineData,
        prompt: &str,
    ) -> Result<ModelResponse> {
        let body = GeminiRequest::new(image, prompt);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        // Prompt blocks come back as HTTP 200
        if let Some(feedback) = gemini_response.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .unwrap_or_else(|| format!("Prompt blocked: {reason}"));
                return Err(CulinaryError::ContentBlocked(msg));
            }
        }

        tracing::debug!(
            candidates = gemini_response.candidates.len(),
            finish_reason = gemini_response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("none"),
            "gemini response received"
        );

        Ok(ModelResponse {
            candidates: gemini_response.candidates,
        })
    }

    fn model_name(&self) -> &str {
        self.model.as_str()
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiRequestPart<'a>>,
}

/// A part in a Gemini request - inline image data or text.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: &'a InlineData,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<&'static str>,
}

impl<'a> GeminiRequest<'a> {
    fn new(image: &'a InlineData, prompt: &'a str) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiRequestPart::InlineData { inline_data: image },
                    GeminiRequestPart::Text { text: prompt },
                ],
            }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_model_as_str() {
        assert_eq!(GeminiModel::FlashImage.as_str(), "gemini-2.5-flash-image");
        assert_eq!(GeminiModel::default(), GeminiModel::FlashImage);
        assert_eq!(
            GeminiModel::from_name("my-tuned-model"),
            GeminiModel::Custom("my-tuned-model".into())
        );
        assert_eq!(
            GeminiModel::from_name("gemini-3-pro-image-preview"),
            GeminiModel::ProImage
        );
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let client = GeminiClientBuilder::new()
            .api_key("test-key")
            .base_url("http://localhost:9999/")
            .build()
            .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
        assert_eq!(client.model_name(), "gemini-2.5-flash-image");
    }

    #[test]
    fn test_request_serialization() {
        let image = InlineData::new("image/jpeg", "/9j/4AAQ");
        let req = GeminiRequest::new(&image, "make it pretty");
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{
                    "parts": [
                        {"inlineData": {"mimeType": "image/jpeg", "data": "/9j/4AAQ"}},
                        {"text": "make it pretty"}
                    ]
                }],
                "generationConfig": {"responseModalities": ["IMAGE", "TEXT"]}
            })
        );
    }

    #[test]
    fn test_response_with_prompt_feedback_block() {
        let json = r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(resp.candidates.is_empty());
        let feedback = resp.prompt_feedback.unwrap();
        assert_eq!(feedback.block_reason.as_deref(), Some("SAFETY"));
    }

    #[test]
    fn test_parse_error_statuses() {
        let client = GeminiClient::builder().api_key("k").build().unwrap();
        let headers = reqwest::header::HeaderMap::new();

        assert!(matches!(
            client.parse_error(401, r#"{"error":{"message":"bad key"}}"#, &headers),
            CulinaryError::Auth(m) if m == "bad key"
        ));
        assert!(matches!(
            client.parse_error(429, "", &headers),
            CulinaryError::RateLimited { retry_after: None }
        ));
        assert!(matches!(
            client.parse_error(400, "Request blocked by safety filter", &headers),
            CulinaryError::ContentBlocked(_)
        ));
        assert!(matches!(
            client.parse_error(500, "internal", &headers),
            CulinaryError::Api { status: 500, .. }
        ));
    }
}
