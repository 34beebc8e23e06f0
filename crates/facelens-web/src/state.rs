//! Application state.

use facelens_core::Gateway;
use std::path::PathBuf;
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub samples_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(gateway: Gateway, samples_dir: Option<PathBuf>) -> Self {
        Self {
            gateway: Arc::new(gateway),
            samples_dir,
        }
    }
}
