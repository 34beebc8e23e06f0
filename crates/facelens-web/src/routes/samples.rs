//! Sample gallery route handler.

use std::path::Path;

use axum::{extract::State, http::StatusCode, Json};
use facelens_core::model::SampleFace;

use crate::state::AppState;

/// URL prefix the sample files are served under.
pub const SAMPLES_PREFIX: &str = "/samples";

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// GET /api/samples - List the sample faces available for analysis.
pub async fn list_samples(
    State(state): State<AppState>,
) -> Result<Json<Vec<SampleFace>>, (StatusCode, String)> {
    let Some(dir) = state.samples_dir.as_deref() else {
        return Ok(Json(Vec::new()));
    };

    let samples = scan_samples(dir)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(samples))
}

/// Collect image files in `dir`, ordered by file name. A missing directory is empty.
pub async fn scan_samples(dir: &Path) -> std::io::Result<Vec<SampleFace>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_image = Path::new(&name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if is_image {
            names.push(name);
        }
    }
    names.sort();

    Ok(names
        .into_iter()
        .enumerate()
        .map(|(i, name)| SampleFace {
            id: i as u32 + 1,
            url: format!("{}/{}", SAMPLES_PREFIX, name),
            name: format!("Sample {}", i + 1),
        })
        .collect())
}
