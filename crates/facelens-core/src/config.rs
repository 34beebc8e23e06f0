//! Service settings.
//!
//! Layered as defaults, then an optional TOML file, then environment
//! variables. Command line flags are applied on top by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{FaceLensError, FaceLensResult};

/// Default Mistral API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.mistral.ai";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "pixtral-12b-2409";

/// Base URL used to resolve relative image references when nothing else is known.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";

/// Ceiling for one analysis, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Largest accepted image (10 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "facelens.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    /// Where site-relative image paths are fetched from. `None` means not configured.
    pub public_base_url: Option<String>,
    pub request_timeout_secs: u64,
    pub max_image_bytes: usize,
    pub samples_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            public_base_url: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            samples_dir: None,
        }
    }
}

impl Settings {
    /// Load settings from `path` (or `facelens.toml` if present) and the process environment.
    pub fn load(path: Option<&Path>) -> FaceLensResult<Self> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        settings.apply_env(|key| std::env::var(key).ok())?;

        if settings.api_key.is_none() {
            warn!("MISTRAL_API_KEY is not set; model calls will fail authentication");
        }
        debug!(
            model = %settings.model,
            api_base = %settings.api_base,
            timeout_secs = settings.request_timeout_secs,
            "Settings loaded"
        );
        Ok(settings)
    }

    /// Parse a TOML settings file.
    pub fn from_file(path: &Path) -> FaceLensResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FaceLensError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
            .map_err(|e| FaceLensError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Override fields from environment variables, read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> FaceLensResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("MISTRAL_API_KEY") {
            self.api_key = Some(v);
        }
        if let Some(v) = non_empty("FACELENS_MODEL") {
            self.model = v;
        }
        if let Some(v) = non_empty("FACELENS_API_BASE") {
            self.api_base = v;
        }
        if let Some(v) = non_empty("FACELENS_BASE_URL") {
            self.public_base_url = Some(v);
        }
        if let Some(v) = non_empty("FACELENS_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number("FACELENS_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = non_empty("FACELENS_MAX_IMAGE_BYTES") {
            self.max_image_bytes = parse_number("FACELENS_MAX_IMAGE_BYTES", &v)?;
        }
        if let Some(v) = non_empty("FACELENS_SAMPLES_DIR") {
            self.samples_dir = Some(PathBuf::from(v));
        }
        Ok(())
    }

    pub fn public_base_url(&self) -> &str {
        self.public_base_url
            .as_deref()
            .unwrap_or(DEFAULT_PUBLIC_BASE_URL)
    }

    /// Point relative image paths at the server listening on `host:port`,
    /// unless a base URL was configured explicitly.
    pub fn use_listen_address(&mut self, host: &str, port: u16) {
        if self.public_base_url.is_some() {
            return;
        }
        let host = match host {
            "0.0.0.0" => "127.0.0.1",
            "::" | "[::]" => "[::1]",
            h => h,
        };
        self.public_base_url = Some(format!("http://{}:{}", host, port));
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> FaceLensResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FaceLensError::Config(format!("{} must be a number, got '{}'", key, value)))
}
