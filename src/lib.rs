#![warn(missing_docs)]
//! Culinary - professional food photography from phone snapshots.
//!
//! This crate sends a photo of a dish to a Gemini image model together with
//! one of two fixed prompts and hands back the generated photo.
//!
//! # Quick Start
//!
//! ```no_run
//! use culinary::{GeminiClient, PhotoTransformer, Session, TransformMode};
//!
//! #[tokio::main]
//! async fn main() -> culinary::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let transformer = PhotoTransformer::from_model(client);
//!
//!     let mut session = Session::new();
//!     session.select_file("burger.jpg")?;
//!     session.set_label("Signature Angus Burger")?;
//!     session.set_mode(TransformMode::Reimagine)?;
//!     session.transform(&transformer).await?;
//!     session.download(".")?;
//!     Ok(())
//! }
//! ```
//!
//! # Modes
//!
//! - `reimagine`: plating and setting chosen to suit the dish, optionally
//!   named by a menu label
//! - `polish`: the dish on a white plate, shot from 45 degrees in a studio
//!
//! # Features
//!
//! - `cli`: the `culinary` binary and its MCP server (default)

mod error;

pub mod config;
pub mod photo;
pub mod session;

#[cfg(feature = "cli")]
#[doc(hidden)]
pub mod mcp;

// Re-export error types at crate root
pub use error::{
    CulinaryError, Result, FILE_READ_MESSAGE, NO_IMAGE_MESSAGE, TRANSFORM_FAILED_MESSAGE,
};

pub use config::Config;

pub use photo::providers::{GeminiClient, GeminiClientBuilder, GeminiModel};
pub use photo::{
    build_prompt, ImageFormat, ImageModel, InlineData, ModelResponse, PhotoTransformer,
    TransformMode, TransformRequest, TransformedPhoto, UploadedImage, DOWNLOAD_FILE_NAME,
};

pub use session::{PendingTransform, Session, SessionState, Settled, Status, Ticket};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{CulinaryError, Result};
    pub use crate::photo::providers::GeminiClient;
    pub use crate::photo::{ImageModel, PhotoTransformer, TransformMode, TransformedPhoto};
    pub use crate::session::{Session, Status};
}
