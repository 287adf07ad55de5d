use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use surfacing_core::{ApiClient, CapturedImage};
use surfacing_infrastructure::{SurfacingPaths, TomlSettingsService};
use surfacing_interaction::GeminiClient;

pub async fn run(paths: &SurfacingPaths, prompt: &str, image: Option<&Path>) -> Result<()> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        anyhow::bail!("Prompt is empty");
    }

    let image = image
        .map(|path| {
            image::open(path)
                .map(CapturedImage::new)
                .with_context(|| format!("Failed to read image {}", path.display()))
        })
        .transpose()?;

    let client = GeminiClient::new(Arc::new(TomlSettingsService::new(paths)?));
    match client.generate(prompt, image).await {
        Ok(text) => println!("{text}"),
        Err(err) => {
            tracing::warn!(error = %err, "Request failed");
            println!("{}", err.user_message());
        }
    }
    Ok(())
}
