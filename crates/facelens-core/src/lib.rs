//! FaceLens Core Library
//!
//! Face analysis gateway: image normalization, vision model invocation and
//! recovery of a validated result from the model's reply.

pub mod config;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod image;
pub mod model;
pub mod vision;

pub use config::Settings;
pub use error::{ErrorKind, FaceLensError, FaceLensResult};
pub use gateway::Gateway;
pub use model::AnalysisResult;
