//! Score Fusion (stacking meta-model)
//!
//! Combines the two base scores into one calibrated synthetic probability:
//!
//! ```text
//! [scoreA, scoreB] → PolynomialTransform (degree 2) → MetaModel → FusionResult
//! ```
//!
//! The input order is part of the fitted model. Coefficients are not symmetric
//! in A and B, so callers must always pass `[scoreA, scoreB]`.
//!
//! # Artifacts
//! Two JSON documents exported from the fitted models:
//!
//! ```json
//! // polynomial_transform.json
//! {"n_features_in": 2, "degree": 2, "include_bias": true,
//!  "powers": [[0,0],[1,0],[0,1],[2,0],[1,1],[0,2]]}
//!
//! // meta_model.json
//! {"members": [{"coef": [0.0, 1.9, 2.4, 0.3, 1.1, 0.2], "intercept": -3.1,
//!               "calibrator": {"a": -1.02, "b": 0.04}}]}
//! ```

pub mod meta_model;
pub mod polynomial;

pub use meta_model::{CalibratedMember, MetaModel, SigmoidCalibrator};
pub use polynomial::PolynomialTransform;

use crate::error::{DetectError, DetectResult};
use crate::types::FusionResult;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

/// Fitted fusion model
#[derive(Debug, Clone)]
pub struct ScoreFusion {
    transform: PolynomialTransform,
    model: MetaModel,
}

impl ScoreFusion {
    /// Build from already-parsed artifacts
    ///
    /// # Errors
    /// Returns `DetectError::Inference` describing the first schema mismatch.
    pub fn new(transform: PolynomialTransform, model: MetaModel) -> DetectResult<Self> {
        transform.validate()?;
        model.validate(transform.n_output_features())?;
        Ok(Self { transform, model })
    }

    /// Load both fusion artifacts
    ///
    /// # Errors
    /// Returns `DetectError::ModelLoad` if either file is missing, malformed,
    /// or does not match the expected schema.
    pub fn load(transform_path: &Path, model_path: &Path) -> DetectResult<Self> {
        let transform: PolynomialTransform = read_artifact(transform_path)?;
        let model: MetaModel = read_artifact(model_path)?;

        let fusion = Self::new(transform, model)
            .map_err(|e| DetectError::model_load(model_path, e))?;
        info!(
            terms = fusion.transform.n_output_features(),
            members = fusion.model.members.len(),
            "Fusion model loaded"
        );
        Ok(fusion)
    }

    /// Fuse `[scoreA, scoreB]` into a calibrated verdict
    ///
    /// # Errors
    /// Returns `DetectError::Inference` if a score is not a probability.
    pub fn fuse(&self, scores: [f64; 2]) -> DetectResult<FusionResult> {
        if let Some(bad) = scores.iter().find(|s| !(0.0..=1.0).contains(*s)) {
            return Err(DetectError::Inference(format!(
                "base score {} is not a probability",
                bad
            )));
        }

        let features = self.transform.transform(&scores)?;
        let probability = self.model.predict_probability(&features);
        if !probability.is_finite() {
            return Err(DetectError::Inference(
                "fusion produced a non-finite probability".to_string(),
            ));
        }

        let result = FusionResult::from_probability(probability);
        debug!(
            score_a = scores[0],
            score_b = scores[1],
            probability,
            label = %result.label,
            "Scores fused"
        );
        Ok(result)
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> DetectResult<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| DetectError::model_load(path, e))?;
    serde_json::from_str(&content).map_err(|e| DetectError::model_load(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fusion(coef: Vec<f64>, intercept: f64) -> ScoreFusion {
        ScoreFusion::new(
            PolynomialTransform::standard(2, 2, true),
            MetaModel {
                members: vec![CalibratedMember {
                    coef,
                    intercept,
                    calibrator: None,
                }],
            },
        )
        .unwrap()
    }

    #[test]
    fn test_fuse_matches_hand_computation() {
        let model = fusion(vec![0.0, 3.0, 1.0, 0.5, 0.0, 0.0], -2.0);
        let result = model.fuse([0.9, 0.8]).unwrap();

        // f = 3*0.9 + 1*0.8 + 0.5*0.81 - 2 = 1.905
        let expected = 1.0 / (1.0 + (-1.905f64).exp());
        assert!((result.probability - expected).abs() < 1e-12);
        assert!(result.is_synthetic());
        assert!((result.confidence - 100.0 * expected).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_scores_rejected() {
        let model = fusion(vec![0.0; 6], 0.0);
        assert!(matches!(model.fuse([1.2, 0.5]), Err(DetectError::Inference(_))));
        assert!(matches!(model.fuse([0.5, f64::NAN]), Err(DetectError::Inference(_))));
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let result = ScoreFusion::new(
            PolynomialTransform::standard(2, 2, true),
            MetaModel {
                members: vec![CalibratedMember {
                    coef: vec![1.0, 2.0],
                    intercept: 0.0,
                    calibrator: None,
                }],
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_artifact() {
        let result = ScoreFusion::load(
            Path::new("/nonexistent/poly.json"),
            Path::new("/nonexistent/meta.json"),
        );
        match result {
            Err(DetectError::ModelLoad { path, .. }) => {
                assert_eq!(path, Path::new("/nonexistent/poly.json"))
            }
            other => panic!("expected ModelLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_load_schema_mismatch_is_model_load() {
        let dir = tempfile::tempdir().unwrap();
        let poly = dir.path().join("poly.json");
        let meta = dir.path().join("meta.json");
        std::fs::write(
            &poly,
            serde_json::to_string(&PolynomialTransform::standard(2, 2, true)).unwrap(),
        )
        .unwrap();
        std::fs::write(&meta, r#"{"members": [{"coef": [1.0], "intercept": 0.0}]}"#).unwrap();

        let result = ScoreFusion::load(&poly, &meta);
        assert!(matches!(result, Err(DetectError::ModelLoad { .. })));
    }
}
