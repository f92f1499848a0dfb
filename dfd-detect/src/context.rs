//! Process-wide inference context
//!
//! Built once at startup and shared read-only (`Arc`) by every request. Holds
//! the provenance checker and, when all artifacts loaded, the ensemble models.
//! A failed load degrades the ensemble to `Unavailable`; it never aborts
//! startup.

use crate::classifiers::{BaseClassifier, OnnxClassifier, PreprocessRecipe};
use crate::config::ModelConfig;
use crate::error::{DetectError, DetectResult};
use crate::fusion::ScoreFusion;
use crate::provenance::ProvenanceChecker;
use crate::types::{BaseScore, EnsembleReport, FusionResult, SourceId};
use image::RgbImage;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Loaded ensemble: both base classifiers and the fusion model
pub struct EnsembleModels {
    classifier_a: Box<dyn BaseClassifier>,
    classifier_b: Box<dyn BaseClassifier>,
    fusion: ScoreFusion,
}

impl EnsembleModels {
    /// Assemble an ensemble from loaded parts
    ///
    /// # Errors
    /// Returns `DetectError::ModelLoad` if the classifiers are not A and B in
    /// that order; the fusion model's coefficients depend on it.
    pub fn new(
        classifier_a: Box<dyn BaseClassifier>,
        classifier_b: Box<dyn BaseClassifier>,
        fusion: ScoreFusion,
    ) -> DetectResult<Self> {
        if classifier_a.source_id() != SourceId::A || classifier_b.source_id() != SourceId::B {
            return Err(DetectError::model_load(
                classifier_a.name(),
                format!(
                    "classifier order must be (A, B), got ({}, {})",
                    classifier_a.source_id(),
                    classifier_b.source_id()
                ),
            ));
        }
        Ok(Self {
            classifier_a,
            classifier_b,
            fusion,
        })
    }

    /// Load both ONNX classifiers and the fusion artifacts
    pub fn load(config: &ModelConfig) -> DetectResult<Self> {
        let classifier_a = OnnxClassifier::load(
            SourceId::A,
            "resnet50",
            &config.classifier_a,
            PreprocessRecipe::RESNET,
            config.synthetic_class_index,
        )?;
        let classifier_b = OnnxClassifier::load(
            SourceId::B,
            "vit",
            &config.classifier_b,
            PreprocessRecipe::VIT,
            config.synthetic_class_index,
        )?;
        let fusion = ScoreFusion::load(&config.polynomial_transform, &config.meta_model)?;

        Self::new(Box::new(classifier_a), Box::new(classifier_b), fusion)
    }

    /// Score a decoded image with both classifiers and fuse
    pub fn evaluate(&self, image: &RgbImage) -> DetectResult<(FusionResult, [BaseScore; 2])> {
        let score_a = self.classifier_a.predict(image)?;
        let score_b = self.classifier_b.predict(image)?;

        let fusion = self.fusion.fuse([score_a.probability, score_b.probability])?;
        Ok((fusion, [score_a, score_b]))
    }

    /// Decode the image at `path` and evaluate it
    ///
    /// The decoded pixels live only for the duration of this call.
    pub fn evaluate_path(&self, path: &Path) -> DetectResult<EnsembleReport> {
        let image = image::open(path)
            .map_err(|e| DetectError::Inference(format!("Invalid image file: {}", e)))?
            .to_rgb8();
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Image decoded"
        );

        let (fusion, scores) = self.evaluate(&image)?;
        Ok(EnsembleReport::new(&fusion, scores))
    }
}

/// Availability of the ensemble capability
pub enum EnsembleCapability {
    Ready(Arc<EnsembleModels>),
    Unavailable { reason: String },
}

/// Immutable state shared by all requests
pub struct InferenceContext {
    provenance: Arc<ProvenanceChecker>,
    ensemble: EnsembleCapability,
}

impl InferenceContext {
    /// Context from already-constructed parts
    pub fn new(provenance: ProvenanceChecker, ensemble: EnsembleCapability) -> Self {
        Self {
            provenance: Arc::new(provenance),
            ensemble,
        }
    }

    /// Load everything the pipeline needs
    ///
    /// Never fails: a model load error is logged and leaves the ensemble
    /// `Unavailable`, while provenance checks keep working.
    pub fn load(config: &ModelConfig) -> Self {
        let provenance = ProvenanceChecker::new();
        if provenance.is_available() {
            info!("Provenance checking available");
        } else {
            info!("Provenance checking unavailable on this platform");
        }

        Self::new(provenance, Self::load_ensemble(config))
    }

    /// Load the ensemble, degrading to `Unavailable` on failure
    pub fn load_ensemble(config: &ModelConfig) -> EnsembleCapability {
        match EnsembleModels::load(config) {
            Ok(models) => {
                info!("Ensemble models loaded");
                EnsembleCapability::Ready(Arc::new(models))
            }
            Err(e) => {
                error!("Ensemble unavailable: {}", e);
                EnsembleCapability::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn provenance(&self) -> &Arc<ProvenanceChecker> {
        &self.provenance
    }

    pub fn ensemble(&self) -> &EnsembleCapability {
        &self.ensemble
    }

    pub fn ensemble_ready(&self) -> bool {
        matches!(self.ensemble, EnsembleCapability::Ready(_))
    }
}
