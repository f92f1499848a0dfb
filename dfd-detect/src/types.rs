//! Core result types for the detection pipeline
//!
//! Every layer transition produces one of the `LayerOutcome` variants and the
//! top-level `AnalysisResult` has a fixed schema, so the JSON handed to the
//! web layer and the report generator never takes an ad hoc shape.

use crate::provenance::ManifestRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Ensemble Types
// ============================================================================

/// Identity of a base classifier within the ensemble
///
/// The order is part of the fusion contract: A is always the first input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceId {
    A,
    B,
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceId::A => write!(f, "A"),
            SourceId::B => write!(f, "B"),
        }
    }
}

/// Synthetic probability produced by one base classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseScore {
    pub source_id: SourceId,
    /// Probability mass on the synthetic class (0.0-1.0)
    pub probability: f64,
}

impl BaseScore {
    pub fn new(source_id: SourceId, probability: f64) -> Self {
        Self {
            source_id,
            probability,
        }
    }
}

/// Final ensemble label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FusionLabel {
    Synthetic,
    Authentic,
}

impl FusionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FusionLabel::Synthetic => "Synthetic",
            FusionLabel::Authentic => "Authentic",
        }
    }
}

impl std::fmt::Display for FusionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the stacking meta-model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    /// Calibrated synthetic probability (0.0-1.0)
    pub probability: f64,
    pub label: FusionLabel,
    /// Certainty of the winning class (0-100)
    pub confidence: f64,
}

impl FusionResult {
    /// Derive label and confidence from a calibrated probability
    ///
    /// Synthetic only when strictly above 0.5; a tie is Authentic.
    pub fn from_probability(probability: f64) -> Self {
        let label = if probability > 0.5 {
            FusionLabel::Synthetic
        } else {
            FusionLabel::Authentic
        };
        Self {
            probability,
            label,
            confidence: 100.0 * probability.max(1.0 - probability),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.label == FusionLabel::Synthetic
    }
}

/// Payload of a completed ensemble layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleReport {
    pub label: FusionLabel,
    pub confidence: f64,
    pub probability: f64,
    /// Base scores in fusion input order (A, B)
    pub base_scores: Vec<BaseScore>,
}

impl EnsembleReport {
    pub fn new(fusion: &FusionResult, base_scores: [BaseScore; 2]) -> Self {
        Self {
            label: fusion.label,
            confidence: fusion.confidence,
            probability: fusion.probability,
            base_scores: base_scores.to_vec(),
        }
    }
}

// ============================================================================
// Layer Outcomes
// ============================================================================

/// Payload carried by a completed layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerPayload {
    Provenance(ManifestRecord),
    Ensemble(EnsembleReport),
}

/// State of one detection layer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LayerOutcome {
    #[default]
    Pending,
    Skipped {
        reason: String,
    },
    Complete {
        payload: LayerPayload,
    },
    Error {
        message: String,
    },
    Unavailable {
        reason: String,
    },
}

impl LayerOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        LayerOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        LayerOutcome::Error {
            message: message.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        LayerOutcome::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, LayerOutcome::Pending)
    }

    /// Status tag as serialised
    pub fn status(&self) -> &'static str {
        match self {
            LayerOutcome::Pending => "pending",
            LayerOutcome::Skipped { .. } => "skipped",
            LayerOutcome::Complete { .. } => "complete",
            LayerOutcome::Error { .. } => "error",
            LayerOutcome::Unavailable { .. } => "unavailable",
        }
    }
}

/// Per-layer outcomes of one analysis
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layers {
    pub provenance: LayerOutcome,
    pub watermark: LayerOutcome,
    pub ensemble: LayerOutcome,
}

// ============================================================================
// Analysis Result
// ============================================================================

/// Top-level result of one image analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub request_id: Uuid,
    pub success: bool,
    /// Sanitised name of the analysed file
    pub filename: Option<String>,
    pub layers: Layers,
    pub final_verdict: Option<String>,
    /// Confidence of the final verdict (0-100)
    pub confidence: f64,
    pub is_synthetic: bool,
    /// Failure message, set iff `success` is false
    pub error: Option<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Fresh result with every layer pending
    pub fn new(filename: Option<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            success: true,
            filename,
            layers: Layers::default(),
            final_verdict: None,
            confidence: 0.0,
            is_synthetic: false,
            error: None,
            analyzed_at: Utc::now(),
        }
    }

    /// Record a failure: the result stays well-formed and no layer is left pending
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        for layer in [
            &mut self.layers.provenance,
            &mut self.layers.watermark,
            &mut self.layers.ensemble,
        ] {
            if layer.is_pending() {
                *layer = LayerOutcome::error(format!("not reached: {}", message));
            }
        }
        self.success = false;
        self.error = Some(message);
    }
}
