//! Error types for dfd-detect
//!
//! Startup failures degrade a capability, per-request failures are captured
//! into the `AnalysisResult`. No variant crosses the pipeline boundary as a
//! hard failure.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Detection error type
#[derive(Debug, Error)]
pub enum DetectError {
    /// Provenance subsystem missing on this platform
    #[error("Provenance unavailable: {0}")]
    PlatformUnavailable(String),

    /// Malformed or unreadable provenance manifest
    #[error("Manifest parse error: {0}")]
    ManifestParse(String),

    /// Classifier or fusion artifact failed to load at startup
    #[error("Model load error ({}): {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },

    /// Failure while running a classifier or the fusion model
    #[error("Inference error: {0}")]
    Inference(String),

    /// Inference did not finish within the configured deadline
    #[error("Inference timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Failure releasing a staged per-request image
    #[error("Resource cleanup error ({}): {source}", path.display())]
    ResourceCleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Upload rejected before analysis (extension, size, name)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DetectError {
    /// Build a model load error for `path`
    pub fn model_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        DetectError::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for detection operations
pub type DetectResult<T> = Result<T, DetectError>;
