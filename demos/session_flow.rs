//! Drives a session the way the UI does: upload, polish, enlarge, download.
//!
//! Run with: `cargo run --example session_flow -- <dish.jpg>`
//!
//! Requires `GOOGLE_API_KEY` (or `API_KEY`) environment variable.

use culinary::{Config, GeminiClientBuilder, PhotoTransformer, Session, TransformMode};

#[tokio::main]
async fn main() -> culinary::Result<()> {
    let input_path = std::env::args()
        .nth(1)
        .expect("Usage: session_flow <dish.jpg>");

    let config = Config::from_env()?;
    let client = GeminiClientBuilder::from_config(&config).build()?;
    let transformer = PhotoTransformer::from_model(client);

    let mut session = Session::new();
    session.select_file(&input_path)?;
    session.set_mode(TransformMode::Polish)?;
    println!("Status: {}", session.status());

    match session.transform(&transformer).await {
        Ok(_) => {
            let preview = session.enlarged().unwrap_or_default();
            println!("Status: {} ({} chars of data URL)", session.status(), preview.len());
            let path = session.download(".")?;
            println!("Downloaded to {}", path.display());
        }
        Err(_) => {
            println!(
                "Status: {} - {}",
                session.status(),
                session.error_message().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}
