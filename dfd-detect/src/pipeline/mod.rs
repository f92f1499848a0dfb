//! Pipeline Orchestrator
//!
//! Runs one staged image through the detection layers and assembles the
//! layered `AnalysisResult`.
//!
//! # Stages
//! ```text
//! START → PROVENANCE ─┬─ proof of AI origin ──────────────────────→ DONE
//!                     └─ otherwise → WATERMARK (skipped) → ENSEMBLE → DONE
//! ```
//!
//! - **Provenance**: C2PA manifest check. A present manifest declaring trained
//!   algorithmic media is cryptographic proof: verdict at 100% confidence, no
//!   classifier runs.
//! - **Watermark**: permanent placeholder, always skipped.
//! - **Ensemble**: both base classifiers plus fusion on the blocking pool,
//!   bounded by the inference deadline. A run holds one inference slot until
//!   it actually finishes, even after its request timed out, so the number of
//!   ensemble runs in flight never exceeds the configured limit.
//!
//! # Error Handling
//! Every failure is captured into the result (`success: false`); `analyze`
//! always returns a well-formed result. The staged image is released on every
//! exit path.

pub mod staging;

pub use staging::StagedImage;

use crate::config::{PipelineConfig, DEFAULT_MAX_CONCURRENT_INFERENCES};
use crate::context::{EnsembleCapability, InferenceContext};
use crate::error::{DetectError, DetectResult};
use crate::types::{AnalysisResult, FusionLabel, LayerOutcome, LayerPayload};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Verdict when the provenance manifest proves synthetic origin
pub const PROVENANCE_VERDICT: &str = "AI Generated (C2PA Verified)";
/// Verdict when the ensemble could not be loaded at startup
pub const MODEL_UNAVAILABLE_VERDICT: &str = "Unknown (model unavailable)";
/// Skip reason for layers bypassed by provenance proof
pub const SKIP_PROVENANCE_VERIFIED: &str = "provenance verified";
/// Skip reason for the watermark placeholder
pub const SKIP_NOT_IMPLEMENTED: &str = "not implemented";

/// Per-request state machine driver
#[derive(Clone)]
pub struct Orchestrator {
    context: Arc<InferenceContext>,
    inference_timeout: Duration,
    inference_slots: Arc<Semaphore>,
}

impl Orchestrator {
    pub fn new(context: Arc<InferenceContext>, config: &PipelineConfig) -> Self {
        Self::with_limits(
            context,
            config.inference_timeout(),
            config.max_concurrent_inferences,
        )
    }

    pub fn with_timeout(context: Arc<InferenceContext>, inference_timeout: Duration) -> Self {
        Self::with_limits(context, inference_timeout, DEFAULT_MAX_CONCURRENT_INFERENCES)
    }

    /// Orchestrator with an explicit deadline and ensemble run limit
    ///
    /// A limit of 0 is raised to 1.
    pub fn with_limits(
        context: Arc<InferenceContext>,
        inference_timeout: Duration,
        max_concurrent_inferences: usize,
    ) -> Self {
        Self {
            context,
            inference_timeout,
            inference_slots: Arc::new(Semaphore::new(max_concurrent_inferences.max(1))),
        }
    }

    /// Analyse one staged image
    ///
    /// Consumes the staged image and releases it before returning, whatever
    /// the outcome.
    pub async fn analyze(&self, staged: StagedImage) -> AnalysisResult {
        let mut result = AnalysisResult::new(Some(staged.filename().to_string()));
        info!(
            request_id = %result.request_id,
            filename = staged.filename(),
            "Analysis started"
        );

        if let Err(e) = self.run_layers(staged.path().to_path_buf(), &mut result).await {
            error!(request_id = %result.request_id, "Analysis failed: {}", e);
            result.fail(e.to_string());
        }

        if let Err(e) = staged.release() {
            warn!(request_id = %result.request_id, "{}", e);
        }

        info!(
            request_id = %result.request_id,
            success = result.success,
            verdict = result.final_verdict.as_deref().unwrap_or("-"),
            confidence = result.confidence,
            "Analysis finished"
        );
        result
    }

    async fn run_layers(&self, path: PathBuf, result: &mut AnalysisResult) -> DetectResult<()> {
        // PROVENANCE
        let checker = Arc::clone(self.context.provenance());
        let provenance_path = path.clone();
        let record = tokio::task::spawn_blocking(move || checker.check(&provenance_path))
            .await
            .map_err(|e| DetectError::ManifestParse(format!("provenance check aborted: {}", e)))?;

        let proves_synthetic = record.proves_synthetic();
        result.layers.provenance = if record.available {
            LayerOutcome::Complete {
                payload: LayerPayload::Provenance(record),
            }
        } else {
            LayerOutcome::unavailable(
                record
                    .message
                    .clone()
                    .unwrap_or_else(|| "provenance support not available".to_string()),
            )
        };

        // SHORT_CIRCUIT
        if proves_synthetic {
            debug!(request_id = %result.request_id, "Provenance proof found, skipping remaining layers");
            result.confidence = 100.0;
            result.is_synthetic = true;
            result.final_verdict = Some(PROVENANCE_VERDICT.to_string());
            result.layers.watermark = LayerOutcome::skipped(SKIP_PROVENANCE_VERIFIED);
            result.layers.ensemble = LayerOutcome::skipped(SKIP_PROVENANCE_VERIFIED);
            return Ok(());
        }

        // WATERMARK_SKIPPED
        result.layers.watermark = LayerOutcome::skipped(SKIP_NOT_IMPLEMENTED);

        // ENSEMBLE
        let models = match self.context.ensemble() {
            EnsembleCapability::Ready(models) => Arc::clone(models),
            EnsembleCapability::Unavailable { reason } => {
                result.layers.ensemble = LayerOutcome::unavailable(reason.clone());
                result.final_verdict = Some(MODEL_UNAVAILABLE_VERDICT.to_string());
                return Ok(());
            }
        };

        // Waiting for a slot counts against the deadline; the permit moves into
        // the blocking task and is freed only when the run completes.
        let slots = Arc::clone(&self.inference_slots);
        let run = async move {
            let permit = slots
                .acquire_owned()
                .await
                .map_err(|e| DetectError::Inference(format!("inference slots closed: {}", e)))?;
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                models.evaluate_path(&path)
            })
            .await
            .map_err(|e| DetectError::Inference(format!("inference task aborted: {}", e)))?
        };
        let outcome = match tokio::time::timeout(self.inference_timeout, run).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DetectError::Timeout(self.inference_timeout)),
        };

        match outcome {
            Ok(report) => {
                result.confidence = report.confidence;
                result.is_synthetic = report.label == FusionLabel::Synthetic;
                result.final_verdict = Some(report.label.as_str().to_string());
                result.layers.ensemble = LayerOutcome::Complete {
                    payload: LayerPayload::Ensemble(report),
                };
                Ok(())
            }
            Err(e) => {
                result.layers.ensemble = LayerOutcome::error(e.to_string());
                Err(e)
            }
        }
    }
}
