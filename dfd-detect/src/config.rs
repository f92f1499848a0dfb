//! Configuration for dfd-detect
//!
//! Resolution priority: TOML file (see `dfd_common::config`) → environment
//! overrides → compiled defaults for anything left unset. Command-line flags
//! are applied by the binary on top of the result.

use dfd_common::config::{env_override, load_toml};
use dfd_common::logging::LoggingConfig;
use dfd_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Directory prefix applied to relative model paths
pub const MODEL_DIR_ENV: &str = "DFD_MODEL_DIR";
/// Staging directory override
pub const STAGING_DIR_ENV: &str = "DFD_STAGING_DIR";
/// Inference deadline override (seconds)
pub const INFERENCE_TIMEOUT_ENV: &str = "DFD_INFERENCE_TIMEOUT_SECS";
/// Concurrent ensemble run limit override
pub const MAX_INFERENCES_ENV: &str = "DFD_MAX_CONCURRENT_INFERENCES";

/// Complete detector configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectorConfig {
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Persisted model artifacts
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Base classifier A (ResNet-50) ONNX export
    #[serde(default = "default_classifier_a")]
    pub classifier_a: PathBuf,
    /// Base classifier B (ViT) ONNX export
    #[serde(default = "default_classifier_b")]
    pub classifier_b: PathBuf,
    /// Fitted polynomial transform (JSON)
    #[serde(default = "default_polynomial_transform")]
    pub polynomial_transform: PathBuf,
    /// Fitted calibrated meta-model (JSON)
    #[serde(default = "default_meta_model")]
    pub meta_model: PathBuf,
    /// Logit index of the synthetic class in both classifiers
    #[serde(default = "default_synthetic_class_index")]
    pub synthetic_class_index: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            classifier_a: default_classifier_a(),
            classifier_b: default_classifier_b(),
            polynomial_transform: default_polynomial_transform(),
            meta_model: default_meta_model(),
            synthetic_class_index: default_synthetic_class_index(),
        }
    }
}

impl ModelConfig {
    /// Resolve relative artifact paths against `base`
    pub fn rebase(&mut self, base: &Path) {
        for path in [
            &mut self.classifier_a,
            &mut self.classifier_b,
            &mut self.polynomial_transform,
            &mut self.meta_model,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

fn default_classifier_a() -> PathBuf {
    PathBuf::from("model_output/resnet50_finetuned_benchmark.onnx")
}

fn default_classifier_b() -> PathBuf {
    PathBuf::from("model_output/ai_vs_real_image_detection.onnx")
}

fn default_polynomial_transform() -> PathBuf {
    PathBuf::from("polynomial_transformer.json")
}

fn default_meta_model() -> PathBuf {
    PathBuf::from("ai_detector_meta_learner.json")
}

fn default_synthetic_class_index() -> usize {
    1
}

/// Per-request pipeline settings
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Deadline for both classifiers plus fusion
    ///
    /// Expiry fails the request but cannot cancel work already running on the
    /// blocking pool. That run keeps its slot in `max_concurrent_inferences`
    /// until it finishes, so repeated timeouts queue behind it instead of
    /// piling up CPU-bound work.
    #[serde(default = "default_inference_timeout_secs")]
    pub inference_timeout_secs: u64,
    /// Ensemble runs allowed on the blocking pool at once
    #[serde(default = "default_max_concurrent_inferences")]
    pub max_concurrent_inferences: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inference_timeout_secs: default_inference_timeout_secs(),
            max_concurrent_inferences: default_max_concurrent_inferences(),
        }
    }
}

impl PipelineConfig {
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }
}

fn default_inference_timeout_secs() -> u64 {
    30
}

/// Default ensemble run limit
pub const DEFAULT_MAX_CONCURRENT_INFERENCES: usize = 2;

fn default_max_concurrent_inferences() -> usize {
    DEFAULT_MAX_CONCURRENT_INFERENCES
}

/// Image staging settings
#[derive(Debug, Clone, Deserialize)]
pub struct StagingConfig {
    /// Directory receiving per-request image copies
    #[serde(default = "default_staging_directory")]
    pub directory: PathBuf,
    /// Maximum accepted image size in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Accepted file extensions (lowercase, no dot)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            directory: default_staging_directory(),
            max_bytes: default_max_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_staging_directory() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_bytes() -> u64 {
    16 * 1024 * 1024
}

fn default_allowed_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl DetectorConfig {
    /// Load from `path` (or defaults), then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config: DetectorConfig = load_toml(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DFD_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(dir) = env_override(MODEL_DIR_ENV) {
            info!("Model directory from environment: {}", dir);
            self.models.rebase(Path::new(&dir));
        }

        if let Some(dir) = env_override(STAGING_DIR_ENV) {
            self.staging.directory = PathBuf::from(dir);
        }

        if let Some(secs) = env_override(INFERENCE_TIMEOUT_ENV) {
            self.pipeline.inference_timeout_secs = secs.parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be a whole number of seconds, got '{}'",
                    INFERENCE_TIMEOUT_ENV, secs
                ))
            })?;
        }

        if let Some(limit) = env_override(MAX_INFERENCES_ENV) {
            self.pipeline.max_concurrent_inferences = limit.parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be a whole number, got '{}'",
                    MAX_INFERENCES_ENV, limit
                ))
            })?;
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.inference_timeout_secs == 0 {
            return Err(Error::Config(
                "pipeline.inference_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.pipeline.max_concurrent_inferences == 0 {
            return Err(Error::Config(
                "pipeline.max_concurrent_inferences must be greater than 0".to_string(),
            ));
        }
        if self.staging.max_bytes == 0 {
            return Err(Error::Config(
                "staging.max_bytes must be greater than 0".to_string(),
            ));
        }
        if self.staging.allowed_extensions.is_empty() {
            return Err(Error::Config(
                "staging.allowed_extensions must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
