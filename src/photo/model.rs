//! The hosted-model capability and the response shape it returns.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Raw bytes (base64) plus their MIME type, as carried in a request or response part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the payload, e.g. `image/png`.
    pub mime_type: String,
    /// Base64-encoded payload.
    pub data: String,
}

impl InlineData {
    /// Creates inline data from a MIME type and base64 payload.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Whether this payload is an image.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// One fragment of a candidate's content: text, inline data, or neither.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsePart {
    /// Text fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline data fragment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl ResponsePart {
    /// A text-only part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// An inline-data part.
    pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData::new(mime_type, data)),
        }
    }
}

/// Ordered parts of a candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateContent {
    /// Parts in the order the model produced them.
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// One alternative answer from the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Content, absent when generation stopped early (e.g. safety).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<CandidateContent>,
    /// Why generation stopped (`STOP`, `IMAGE_SAFETY`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl Candidate {
    /// A finished candidate with the given parts.
    pub fn with_parts(parts: Vec<ResponsePart>) -> Self {
        Self {
            content: Some(CandidateContent { parts }),
            finish_reason: Some("STOP".into()),
        }
    }
}

/// A model answer: ordered candidates, only the first of which is consulted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Candidates in model order.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl ModelResponse {
    /// A response with a single candidate holding `parts`.
    pub fn single(parts: Vec<ResponsePart>) -> Self {
        Self {
            candidates: vec![Candidate::with_parts(parts)],
        }
    }

    /// First image payload in the first candidate, skipping text and non-image parts.
    pub fn first_image(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| d.is_image() && !d.data.is_empty())
    }
}

/// Capability to send one image plus a text prompt to a hosted model.
///
/// Implementations must ask for both image and text response modalities and
/// must not retry.
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Sends the image and prompt, returning the parsed model answer.
    async fn send_image_and_prompt(&self, image: &InlineData, prompt: &str)
        -> Result<ModelResponse>;

    /// Model identifier used for display and logging.
    fn model_name(&self) -> &str;
}
