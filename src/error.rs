//! Error types for photo transformation.

use std::time::Duration;

/// Generic message shown when a transform fails for reasons other than a
/// missing image. The underlying cause is logged, never shown.
pub const TRANSFORM_FAILED_MESSAGE: &str =
    "Failed to generate the image. The AI model might be unavailable or the request failed.";

/// Message shown when the model answered without an image part.
pub const NO_IMAGE_MESSAGE: &str = "AI did not return an image. Please try again.";

/// Message shown when a selected file could not be read.
pub const FILE_READ_MESSAGE: &str = "Failed to read the selected file.";

/// Errors that can occur while preparing, sending or storing a transform.
#[derive(Debug, thiserror::Error)]
pub enum CulinaryError {
    /// The local file could not be read or decoded into a data URL.
    #[error("failed to read the selected file: {0}")]
    FileRead(String),

    /// The selected file is not one of the accepted image types.
    #[error("unsupported image type: {0} (expected image/png, image/jpeg or image/webp)")]
    UnsupportedImage(String),

    /// The model response contained no image part.
    #[error("model response contained no image data")]
    NoImageReturned,

    /// Any other failure while contacting the model or parsing its answer.
    #[error("transform failed: {source}")]
    TransformFailed {
        /// The underlying failure.
        #[source]
        source: Box<CulinaryError>,
    },

    /// No API credential in the environment. Fatal at startup.
    #[error("missing API credential: set {0}")]
    MissingCredential(String),

    /// The intent is not allowed in the current session state.
    #[error("{0}")]
    InvalidState(String),

    /// A request parameter could not be understood.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// API key rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized error message from the response body.
        message: String,
    },

    /// Rate limit or quota exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Wait suggested by the `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// Prompt or output blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Response did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Call exceeded the caller-imposed deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CulinaryError {
    /// Wraps any error as a [`CulinaryError::TransformFailed`].
    ///
    /// `NoImageReturned` and already-wrapped errors pass through unchanged.
    pub fn into_transform_failure(self) -> Self {
        match self {
            Self::NoImageReturned | Self::TransformFailed { .. } => self,
            other => Self::TransformFailed {
                source: Box::new(other),
            },
        }
    }

    /// Returns the text to show the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::FileRead(_) => FILE_READ_MESSAGE.to_string(),
            Self::NoImageReturned => NO_IMAGE_MESSAGE.to_string(),
            Self::TransformFailed { .. } | Self::Timeout(_) => {
                TRANSFORM_FAILED_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, CulinaryError>;

/// Reads a `Retry-After` header expressed in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Longest error body kept in an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Pulls `error.message` out of a Google API error body and bounds its length.
pub(crate) fn sanitize_error_message(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    if message.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = message.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}...")
    } else {
        message
    }
}
