//! Centralized error types for FaceLens.

use std::time::Duration;

use thiserror::Error;

/// Main error type for FaceLens operations.
#[derive(Error, Debug)]
pub enum FaceLensError {
    #[error("No image provided")]
    MissingImage,

    #[error("Invalid image format: {0}")]
    InvalidImage(String),

    #[error("Image too large: {size} bytes (limit is {limit} bytes)")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("Failed to fetch image: {0}")]
    ImageFetch(String),

    #[error("Vision model error: {0}")]
    Upstream(String),

    #[error("Vision model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Failed to parse AI response: {reason}")]
    Parse { reason: String, raw: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for FaceLens operations.
pub type FaceLensResult<T> = Result<T, FaceLensError>;

/// Coarse classification of a failure, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed image reference.
    InvalidInput,
    /// Network, auth or quota error while fetching the image or calling the model.
    UpstreamFailure,
    /// The model replied but no valid analysis could be extracted.
    ParseFailure,
    /// Bad settings detected at startup.
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::UpstreamFailure => "upstream_failure",
            ErrorKind::ParseFailure => "parse_failure",
            ErrorKind::Config => "config",
        }
    }
}

impl FaceLensError {
    /// Create an invalid image error.
    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create an upstream error.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a parse error that keeps the raw model reply.
    pub fn parse(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingImage | Self::InvalidImage(_) | Self::ImageTooLarge { .. } => {
                ErrorKind::InvalidInput
            }
            Self::ImageFetch(_) | Self::Upstream(_) | Self::Timeout(_) => {
                ErrorKind::UpstreamFailure
            }
            Self::Parse { .. } => ErrorKind::ParseFailure,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// The unparsed model reply, for parse failures.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(FaceLensError::MissingImage.kind(), ErrorKind::InvalidInput);
        assert_eq!(
            FaceLensError::ImageTooLarge { size: 2, limit: 1 }.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            FaceLensError::ImageFetch("404".into()).kind(),
            ErrorKind::UpstreamFailure
        );
        assert_eq!(
            FaceLensError::Timeout(Duration::from_secs(1)).kind(),
            ErrorKind::UpstreamFailure
        );
        assert_eq!(
            FaceLensError::parse("bad", "raw").kind(),
            ErrorKind::ParseFailure
        );
    }

    #[test]
    fn test_raw_response_only_on_parse() {
        assert_eq!(FaceLensError::parse("bad", "hello").raw_response(), Some("hello"));
        assert_eq!(FaceLensError::upstream("401").raw_response(), None);
    }
}
