//! Interaction state for one user: selected photo, result and status.
//!
//! All state lives in a single [`SessionState`] value, so combinations such as
//! "error while processing" cannot be represented. Transforms are split into
//! [`Session::begin_transform`] and [`Session::finish_transform`] so a shell can
//! run the network call without holding the session; a response whose
//! [`Ticket`] no longer matches the current selection is discarded.

use crate::error::{CulinaryError, Result, FILE_READ_MESSAGE};
use crate::photo::{
    PhotoTransformer, TransformMode, TransformRequest, TransformedPhoto, UploadedImage,
    DOWNLOAD_FILE_NAME,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Message shown when a transform is requested with nothing selected.
pub const NO_IMAGE_SELECTED_MESSAGE: &str = "Please upload an image first.";

/// Coarse status used to enable or disable controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Nothing in flight (a photo may or may not be selected).
    Idle,
    /// A file is being read.
    Uploading,
    /// A transform is in flight.
    Processing,
    /// The last transform produced a photo.
    Success,
    /// The last action failed.
    Error,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Everything the session knows, as one value.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No photo selected.
    #[default]
    Idle,
    /// A file is being read.
    Uploading,
    /// A photo is selected and ready to transform.
    Ready(UploadedImage),
    /// A transform for `request` is in flight.
    Processing {
        /// The photo being transformed.
        image: UploadedImage,
        /// The request sent to the model.
        request: TransformRequest,
    },
    /// The transform succeeded.
    Success {
        /// The photo that was transformed.
        image: UploadedImage,
        /// The generated photo.
        photo: TransformedPhoto,
    },
    /// The last action failed; the selected photo survives if there was one.
    Error {
        /// The selected photo, if any.
        image: Option<UploadedImage>,
        /// User-facing error text.
        message: String,
    },
}

impl SessionState {
    /// The status derived from this state.
    pub fn status(&self) -> Status {
        match self {
            Self::Idle | Self::Ready(_) => Status::Idle,
            Self::Uploading => Status::Uploading,
            Self::Processing { .. } => Status::Processing,
            Self::Success { .. } => Status::Success,
            Self::Error { .. } => Status::Error,
        }
    }

    /// The selected photo, if any.
    pub fn image(&self) -> Option<&UploadedImage> {
        match self {
            Self::Ready(image)
            | Self::Processing { image, .. }
            | Self::Success { image, .. } => Some(image),
            Self::Error { image, .. } => image.as_ref(),
            Self::Idle | Self::Uploading => None,
        }
    }
}

/// Identifies the selection an upload or transform was started for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// A transform that has been started and must be settled with
/// [`Session::finish_transform`].
#[derive(Debug, Clone)]
pub struct PendingTransform {
    /// Ticket to hand back when settling.
    pub ticket: Ticket,
    /// The request to send.
    pub request: TransformRequest,
}

/// How a settled transform was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// The result was applied; the session now has this status.
    Applied(Status),
    /// The selection changed while the call was in flight; result dropped.
    Stale,
}

/// One user's interaction state.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    mode: TransformMode,
    label: String,
    selection: u64,
}

impl Session {
    /// Creates an idle session in `Reimagine` mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.state.status()
    }

    /// Selected prompt mode.
    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    /// Current food label (may be empty).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Selected photo, if any.
    pub fn image(&self) -> Option<&UploadedImage> {
        self.state.image()
    }

    /// Generated photo, if the last transform succeeded.
    pub fn result(&self) -> Option<&TransformedPhoto> {
        match &self.state {
            SessionState::Success { photo, .. } => Some(photo),
            _ => None,
        }
    }

    /// User-facing error, if the last action failed.
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether a transform may be started now.
    pub fn can_transform(&self) -> bool {
        !self.is_processing() && self.image().is_some()
    }

    fn is_processing(&self) -> bool {
        matches!(self.state, SessionState::Processing { .. })
    }

    fn ensure_not_processing(&self, action: &str) -> Result<()> {
        if self.is_processing() {
            return Err(CulinaryError::InvalidState(format!(
                "Cannot {action} while a transform is in progress."
            )));
        }
        Ok(())
    }

    /// Selects the prompt mode.
    pub fn set_mode(&mut self, mode: TransformMode) -> Result<()> {
        self.ensure_not_processing("change the mode")?;
        self.mode = mode;
        Ok(())
    }

    /// Sets the optional food label.
    pub fn set_label(&mut self, label: impl Into<String>) -> Result<()> {
        self.ensure_not_processing("change the label")?;
        self.label = label.into();
        Ok(())
    }

    /// Drops the photo, result, error and label. Outstanding tickets go stale.
    pub fn clear(&mut self) {
        self.selection = self.selection.wrapping_add(1);
        self.state = SessionState::Idle;
        self.label.clear();
        tracing::debug!(selection = self.selection, "session cleared");
    }

    /// Starts reading a new photo: clears the previous one and enters `Uploading`.
    pub fn begin_upload(&mut self) -> Result<Ticket> {
        self.ensure_not_processing("upload a new photo")?;
        self.clear();
        self.state = SessionState::Uploading;
        Ok(Ticket(self.selection))
    }

    /// Settles an upload started with [`begin_upload`](Self::begin_upload).
    ///
    /// Unsupported image types leave nothing selected; other failures move
    /// the session to `Error`.
    pub fn finish_upload(
        &mut self,
        ticket: Ticket,
        result: Result<UploadedImage>,
    ) -> Result<&UploadedImage> {
        if ticket.0 != self.selection || !matches!(self.state, SessionState::Uploading) {
            return Err(CulinaryError::InvalidState(
                "Upload was superseded by a newer action.".into(),
            ));
        }

        match result {
            Ok(image) => {
                tracing::debug!(mime_type = image.mime_type(), "photo selected");
                self.state = SessionState::Ready(image);
                self.image().ok_or_else(|| {
                    CulinaryError::InvalidState("photo missing after upload".into())
                })
            }
            Err(e @ CulinaryError::UnsupportedImage(_)) => {
                self.state = SessionState::Idle;
                Err(e)
            }
            Err(e) => {
                tracing::warn!("failed to read selected file: {e}");
                self.state = SessionState::Error {
                    image: None,
                    message: FILE_READ_MESSAGE.to_string(),
                };
                Err(match e {
                    CulinaryError::FileRead(_) => e,
                    other => CulinaryError::FileRead(other.to_string()),
                })
            }
        }
    }

    /// Reads and selects a photo from disk.
    pub fn select_file(&mut self, path: impl AsRef<Path>) -> Result<&UploadedImage> {
        let ticket = self.begin_upload()?;
        self.finish_upload(ticket, UploadedImage::from_path(path))
    }

    /// Selects a photo from raw bytes.
    pub fn select_bytes(&mut self, data: &[u8], mime_type: &str) -> Result<&UploadedImage> {
        let ticket = self.begin_upload()?;
        self.finish_upload(ticket, UploadedImage::from_bytes(data, mime_type))
    }

    /// Selects a photo from a `data:` URL.
    pub fn select_data_url(&mut self, url: &str) -> Result<&UploadedImage> {
        let ticket = self.begin_upload()?;
        self.finish_upload(ticket, UploadedImage::from_data_url(url))
    }

    /// Enters `Processing` and returns the request to send.
    pub fn begin_transform(&mut self) -> Result<PendingTransform> {
        match &self.state {
            SessionState::Processing { .. } => {
                return Err(CulinaryError::InvalidState(
                    "A transform is already in progress.".into(),
                ));
            }
            SessionState::Uploading => {
                return Err(CulinaryError::InvalidState(
                    "Wait for the upload to finish.".into(),
                ));
            }
            _ => {}
        }

        let Some(image) = self.image().cloned() else {
            self.state = SessionState::Error {
                image: None,
                message: NO_IMAGE_SELECTED_MESSAGE.to_string(),
            };
            return Err(CulinaryError::InvalidState(
                NO_IMAGE_SELECTED_MESSAGE.to_string(),
            ));
        };

        let request = TransformRequest::from_upload(&image, self.mode).with_label(&self.label);
        self.state = SessionState::Processing {
            image,
            request: request.clone(),
        };
        tracing::debug!(mode = %self.mode, selection = self.selection, "transform started");

        Ok(PendingTransform {
            ticket: Ticket(self.selection),
            request,
        })
    }

    /// Settles a transform started with [`begin_transform`](Self::begin_transform).
    ///
    /// Returns the original error when the transform failed for the current
    /// selection. Results for a cleared or replaced selection are dropped and
    /// reported as [`Settled::Stale`].
    pub fn finish_transform(
        &mut self,
        ticket: Ticket,
        result: Result<TransformedPhoto>,
    ) -> Result<Settled> {
        let image = match &self.state {
            SessionState::Processing { image, .. } if ticket.0 == self.selection => image.clone(),
            _ => {
                tracing::warn!(
                    ticket = ticket.0,
                    selection = self.selection,
                    "discarding stale transform response"
                );
                return Ok(Settled::Stale);
            }
        };

        match result {
            Ok(photo) => {
                self.state = SessionState::Success { image, photo };
                Ok(Settled::Applied(Status::Success))
            }
            Err(e) => {
                self.state = SessionState::Error {
                    image: Some(image),
                    message: e.user_message(),
                };
                Err(e)
            }
        }
    }

    /// Runs one transform to completion.
    pub async fn transform(&mut self, transformer: &PhotoTransformer) -> Result<&TransformedPhoto> {
        self.run_transform(transformer, None).await
    }

    /// Runs one transform, failing with a timeout after `limit`.
    pub async fn transform_within(
        &mut self,
        transformer: &PhotoTransformer,
        limit: Duration,
    ) -> Result<&TransformedPhoto> {
        self.run_transform(transformer, Some(limit)).await
    }

    async fn run_transform(
        &mut self,
        transformer: &PhotoTransformer,
        limit: Option<Duration>,
    ) -> Result<&TransformedPhoto> {
        let pending = self.begin_transform()?;
        let call = transformer.transform_photo(&pending.request);
        let result = match limit {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(CulinaryError::Timeout(limit).into_transform_failure()),
            },
            None => call.await,
        };

        self.finish_transform(pending.ticket, result)?;
        self.result()
            .ok_or_else(|| CulinaryError::InvalidState("transform result missing".into()))
    }

    /// The generated photo as a data URL, for full-size display.
    pub fn enlarged(&self) -> Option<String> {
        self.result().map(TransformedPhoto::to_data_url)
    }

    /// Saves the generated photo as `professional-food-photo.jpeg` in `dir`.
    pub fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(DOWNLOAD_FILE_NAME);
        self.download_to(&path)?;
        Ok(path)
    }

    /// Saves the generated photo to an explicit path.
    pub fn download_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let photo = self
            .result()
            .ok_or_else(|| CulinaryError::InvalidState("No generated photo to download.".into()))?;
        photo.save(path)
    }
}
