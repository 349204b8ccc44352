//! Photo transformation: prompts, model capability and the adapter.

mod model;
mod prompt;
pub mod providers;
mod transform;
mod types;

pub use model::{Candidate, CandidateContent, ImageModel, InlineData, ModelResponse, ResponsePart};
pub use prompt::{build_prompt, normalize_label, TransformMode};
pub use transform::PhotoTransformer;
pub use types::{ImageFormat, TransformRequest, TransformedPhoto, UploadedImage, DOWNLOAD_FILE_NAME};

#[cfg(test)]
pub(crate) use transform::fake;
