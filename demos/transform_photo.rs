//! Transforms one food photo with the adapter directly.
//!
//! Run with: `cargo run --example transform_photo -- <dish.jpg> [label]`
//!
//! Requires `GOOGLE_API_KEY` (or `API_KEY`) environment variable.

use culinary::{GeminiClient, PhotoTransformer, TransformMode, TransformRequest, UploadedImage};

#[tokio::main]
async fn main() -> culinary::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .expect("Usage: transform_photo <dish.jpg> [label]");
    let label = std::env::args().nth(2);

    let image = UploadedImage::from_path(&input_path)?;
    let client = GeminiClient::builder().build()?;
    let transformer = PhotoTransformer::from_model(client);

    let mut request = TransformRequest::from_upload(&image, TransformMode::Reimagine);
    if let Some(label) = label {
        request = request.with_label(label);
    }

    let photo = transformer.transform_photo(&request).await?;
    photo.save(culinary::DOWNLOAD_FILE_NAME)?;
    println!(
        "Saved {} ({})",
        culinary::DOWNLOAD_FILE_NAME,
        photo.mime_type()
    );

    Ok(())
}
