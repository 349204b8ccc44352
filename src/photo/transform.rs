//! Adapter between a transform request and the hosted model.

use crate::error::{CulinaryError, Result};
use crate::photo::model::{ImageModel, InlineData};
use crate::photo::prompt::build_prompt;
use crate::photo::types::{TransformRequest, TransformedPhoto};
use std::sync::Arc;
use std::time::Instant;

/// Turns food photos into professional shots through an [`ImageModel`].
///
/// Holds no mutable state; clone it freely or share it behind an `Arc`.
#[derive(Clone)]
pub struct PhotoTransformer {
    model: Arc<dyn ImageModel>,
}

impl PhotoTransformer {
    /// Creates a transformer over the given model capability.
    pub fn new(model: Arc<dyn ImageModel>) -> Self {
        Self { model }
    }

    /// Creates a transformer owning the given model.
    pub fn from_model(model: impl ImageModel + 'static) -> Self {
        Self::new(Arc::new(model))
    }

    /// Name of the underlying model.
    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Transforms the photo and returns the generated image as base64.
    ///
    /// Fails with [`CulinaryError::NoImageReturned`] when the model answers
    /// without an image, and [`CulinaryError::TransformFailed`] for anything
    /// else.
    pub async fn transform(&self, request: &TransformRequest) -> Result<String> {
        self.transform_photo(request)
            .await
            .map(|photo| photo.base64().to_string())
    }

    /// Like [`transform`](Self::transform) but keeps the returned MIME type.
    pub async fn transform_photo(&self, request: &TransformRequest) -> Result<TransformedPhoto> {
        let start = Instant::now();
        let prompt = build_prompt(request.mode, request.label.as_deref());
        let image = InlineData::new(&request.mime_type, &request.image_base64);

        tracing::debug!(
            model = self.model.model_name(),
            mode = %request.mode,
            mime_type = %request.mime_type,
            "sending transform request"
        );

        let response = match self.model.send_image_and_prompt(&image, &prompt).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(model = self.model.model_name(), "error transforming image: {e}");
                return Err(e.into_transform_failure());
            }
        };

        let inline = response.first_image().ok_or_else(|| {
            tracing::warn!(
                candidates = response.candidates.len(),
                "model response contained no image part"
            );
            CulinaryError::NoImageReturned
        })?;

        tracing::debug!(
            mime_type = %inline.mime_type,
            duration_ms = start.elapsed().as_millis() as u64,
            "transform complete"
        );

        Ok(TransformedPhoto::new(
            inline.data.clone(),
            inline.mime_type.clone(),
        ))
    }
}

impl std::fmt::Debug for PhotoTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoTransformer")
            .field("model", &self.model.model_name())
            .finish()
    }
}
