//! HTTP mapping of gateway failures.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use facelens_core::{ErrorKind, FaceLensError};
use serde::Serialize;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    Analysis(FaceLensError),
    MalformedBody(JsonRejection),
}

impl From<FaceLensError> for ApiError {
    fn from(e: FaceLensError) -> Self {
        Self::Analysis(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::MalformedBody(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::MalformedBody(r) if r.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::Analysis(e) => match e.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::MalformedBody(r) => ErrorBody {
                error: format!("Invalid request body: {}", r.body_text()),
                kind: ErrorKind::InvalidInput.as_str(),
                raw_response: None,
            },
            Self::Analysis(e) => {
                let error = match e {
                    FaceLensError::MissingImage => "No image provided".to_string(),
                    FaceLensError::InvalidImage(_) => "Invalid image format".to_string(),
                    FaceLensError::ImageTooLarge { .. } => e.to_string(),
                    FaceLensError::Parse { .. } => "Failed to parse AI response".to_string(),
                    // Provider details stay in the logs.
                    _ => "Failed to analyze image".to_string(),
                };
                ErrorBody {
                    error,
                    kind: e.kind().as_str(),
                    raw_response: e.raw_response().map(str::to_string),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Analysis failed");
        } else {
            tracing::debug!(error = ?self, "Rejected analysis request");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_by_kind() {
        assert_eq!(
            ApiError::from(FaceLensError::MissingImage).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(FaceLensError::Timeout(Duration::from_secs(30))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(FaceLensError::parse("bad", "raw")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_detail_not_leaked() {
        let body = ApiError::from(FaceLensError::upstream("HTTP 401 invalid key sk-123")).body();
        assert_eq!(body.error, "Failed to analyze image");
        assert_eq!(body.kind, "upstream_failure");
        assert!(body.raw_response.is_none());
    }

    #[test]
    fn test_parse_failure_carries_raw() {
        let body = ApiError::from(FaceLensError::parse("no JSON", "sorry")).body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "Failed to parse AI response");
        assert_eq!(json["kind"], "parse_failure");
        assert_eq!(json["rawResponse"], "sorry");
    }
}
