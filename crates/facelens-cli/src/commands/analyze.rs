//! One-shot analysis command.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use facelens_core::image::{media_type_from_path, EncodedImage};
use facelens_core::{Gateway, Settings};
use std::path::Path;

use crate::output;

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Image file, http(s) URL or data URI
    pub image: String,

    /// Print the raw JSON result instead of the formatted report
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: AnalyzeArgs, settings: Settings) -> Result<()> {
    let image_ref = to_image_ref(&args.image, settings.max_image_bytes).await?;
    let gateway = Gateway::from_settings(&settings)?;

    if !args.json {
        println!("{} Analyzing image: {}", "→".dimmed(), args.image);
        println!();
    }

    let result = match gateway.analyze(&image_ref).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!(
                "{} Analysis failed ({}): {}",
                "✗".red().bold(),
                e.kind().as_str(),
                e
            );
            if let Some(raw) = e.raw_response() {
                eprintln!();
                eprintln!("{}", "Raw model response:".bold());
                eprintln!("{}", raw.dimmed());
            }
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        output::print_analysis(&result);
    }

    Ok(())
}

/// Local files become data URIs; anything else is passed through as a reference.
async fn to_image_ref(image: &str, max_bytes: usize) -> Result<String> {
    let path = Path::new(image);
    if image.starts_with("data:") || !path.is_file() {
        return Ok(image.to_string());
    }

    let size = tokio::fs::metadata(path).await?.len() as usize;
    if size > max_bytes {
        anyhow::bail!("{} is {} bytes, the limit is {} bytes", image, size, max_bytes);
    }

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", image))?;
    tracing::debug!(path = image, size = bytes.len(), "Read local image");

    Ok(EncodedImage::from_bytes(media_type_from_path(image), &bytes).to_data_uri())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_file_becomes_data_uri() {
        let path = std::env::temp_dir().join(format!("facelens-cli-{}.png", std::process::id()));
        std::fs::write(&path, b"abc").unwrap();

        let image_ref = to_image_ref(path.to_str().unwrap(), 1024).await.unwrap();
        assert_eq!(image_ref, "data:image/png;base64,YWJj");

        let err = to_image_ref(path.to_str().unwrap(), 2).await.unwrap_err();
        assert!(err.to_string().contains("limit"));

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_references_pass_through() {
        for reference in [
            "https://example.com/face.jpg",
            "/samples/face1.jpg",
            "data:image/png;base64,AA==",
        ] {
            assert_eq!(to_image_ref(reference, 1024).await.unwrap(), reference);
        }
    }
}
