//! Face analysis route handler.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use facelens_core::model::{AnalysisRequest, AnalysisResult};

use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/analyze-face - Analyze the face in `imageUrl`.
pub async fn analyze_face(
    State(state): State<AppState>,
    body: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(req) = body?;
    let image_url = req.image_url.unwrap_or_default();

    let result = state.gateway.analyze(&image_url).await?;

    Ok(Json(result))
}
