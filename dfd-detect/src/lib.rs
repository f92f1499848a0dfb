//! dfd-detect - synthetic image detection core
//!
//! Decides whether an image is AI-generated by layering a C2PA provenance
//! check over a two-model classifier ensemble fused by a stacking meta-model.
//!
//! ```rust,ignore
//! use dfd_detect::{DetectorConfig, InferenceContext, Orchestrator, StagedImage};
//!
//! let config = DetectorConfig::load(None)?;
//! let context = Arc::new(InferenceContext::load(&config.models));
//! let orchestrator = Orchestrator::new(context, &config.pipeline);
//!
//! let staged = StagedImage::stage_file(&config.staging, Path::new("photo.jpg"))?;
//! let result = orchestrator.analyze(staged).await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! ```

pub mod classifiers;
pub mod config;
pub mod context;
pub mod error;
pub mod fusion;
pub mod pipeline;
pub mod provenance;
pub mod types;

pub use crate::config::DetectorConfig;
pub use crate::context::{EnsembleCapability, EnsembleModels, InferenceContext};
pub use crate::error::{DetectError, DetectResult};
pub use crate::pipeline::{Orchestrator, StagedImage};
pub use crate::types::{AnalysisResult, FusionLabel, FusionResult, LayerOutcome};
