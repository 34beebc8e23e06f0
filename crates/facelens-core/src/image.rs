//! Image normalization.
//!
//! Turns an image reference (inline `data:` URI, path relative to the public
//! site, or absolute URL) into a base64 payload plus its media type.

use std::sync::LazyLock;
use std::time::Duration;

use base64::Engine;
use regex::Regex;
use tracing::debug;

use crate::error::{FaceLensError, FaceLensResult};

/// Media type used when a fetched image declares none.
pub const DEFAULT_MEDIA_TYPE: &str = "image/jpeg";

static DATA_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:([^;]+);base64,([^\r\n]+)$").expect("data URI pattern is valid")
});

/// A parsed image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Self-contained `data:<type>;base64,<payload>` URI.
    DataUri(String),
    /// Path on the public site, e.g. `/samples/face1.jpg`.
    Relative(String),
    /// Absolute http(s) URL.
    Url(String),
}

impl ImageRef {
    pub fn parse(input: &str) -> FaceLensResult<Self> {
        if input.trim().is_empty() {
            return Err(FaceLensError::MissingImage);
        }
        if input.starts_with("data:") {
            return Ok(Self::DataUri(input.to_string()));
        }
        if input.starts_with('/') {
            return Ok(Self::Relative(input.to_string()));
        }
        match reqwest::Url::parse(input) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                Ok(Self::Url(input.to_string()))
            }
            Ok(url) => Err(FaceLensError::invalid_image(format!(
                "unsupported URL scheme '{}'",
                url.scheme()
            ))),
            Err(e) => Err(FaceLensError::invalid_image(format!("not a URL: {}", e))),
        }
    }
}

/// Base64 image payload with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub media_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn from_bytes(media_type: &str, bytes: &[u8]) -> Self {
        Self {
            media_type: media_type.to_string(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Render back to a `data:` URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }

    /// Size of the decoded image, estimated from the payload length.
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4 * 3 + (self.data.len() % 4) * 3 / 4).saturating_sub(padding)
    }
}

/// Split a `data:<type>;base64,<payload>` URI. Both parts are returned unchanged.
pub fn parse_data_uri(uri: &str) -> FaceLensResult<EncodedImage> {
    let caps = DATA_URI
        .captures(uri)
        .ok_or_else(|| FaceLensError::invalid_image("expected data:<type>;base64,<payload>"))?;

    Ok(EncodedImage {
        media_type: caps[1].to_string(),
        data: caps[2].to_string(),
    })
}

/// Guess the media type of a file from its extension.
pub fn media_type_from_path(path: &str) -> &'static str {
    let lower = path.to_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else if lower.ends_with(".bmp") {
        "image/bmp"
    } else {
        DEFAULT_MEDIA_TYPE
    }
}

/// Resolves image references into [`EncodedImage`]s, downloading when needed.
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    public_base_url: String,
    max_bytes: usize,
}

impl ImageFetcher {
    /// Create a fetcher whose downloads are bounded by `timeout`.
    pub fn new(
        public_base_url: &str,
        max_bytes: usize,
        timeout: Duration,
    ) -> FaceLensResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FaceLensError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_bytes,
        })
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Normalize a parsed reference.
    pub async fn normalize(&self, image: &ImageRef) -> FaceLensResult<EncodedImage> {
        let encoded = match image {
            ImageRef::DataUri(uri) => parse_data_uri(uri)?,
            ImageRef::Relative(path) => {
                let url = format!("{}{}", self.public_base_url, path);
                self.fetch(&url).await?
            }
            ImageRef::Url(url) => self.fetch(url).await?,
        };

        let size = encoded.decoded_len();
        if size > self.max_bytes {
            return Err(FaceLensError::ImageTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(encoded)
    }

    /// Download an image and base64-encode it.
    pub async fn fetch(&self, url: &str) -> FaceLensResult<EncodedImage> {
        debug!(url = url, "Downloading image");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FaceLensError::ImageFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FaceLensError::ImageFetch(format!("HTTP {} from {}", status, url)));
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_bytes {
                return Err(FaceLensError::ImageTooLarge {
                    size: len as usize,
                    limit: self.max_bytes,
                });
            }
        }

        let media_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.split(';').next().unwrap_or(s).trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FaceLensError::ImageFetch(e.to_string()))?;

        if bytes.len() > self.max_bytes {
            return Err(FaceLensError::ImageTooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }

        debug!(size = bytes.len(), media_type = %media_type, "Image downloaded");
        Ok(EncodedImage::from_bytes(&media_type, &bytes))
    }
}
