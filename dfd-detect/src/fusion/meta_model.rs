//! Calibrated linear meta-model
//!
//! A fitted linear classifier over the expanded features, optionally wrapped
//! in sigmoid (Platt) calibration. A cross-validated calibrated classifier is
//! stored as several members whose calibrated probabilities are averaged.

use crate::error::{DetectError, DetectResult};
use serde::{Deserialize, Serialize};

/// Sigmoid calibrator: `p = 1 / (1 + exp(a·f + b))`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmoidCalibrator {
    pub a: f64,
    pub b: f64,
}

/// One fitted linear classifier with its calibrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedMember {
    pub coef: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub calibrator: Option<SigmoidCalibrator>,
}

impl CalibratedMember {
    fn decision(&self, features: &[f64]) -> f64 {
        self.coef
            .iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept
    }

    /// Positive-class probability for one feature vector
    fn probability(&self, features: &[f64]) -> f64 {
        let f = self.decision(features);
        match self.calibrator {
            Some(SigmoidCalibrator { a, b }) => sigmoid(-(a * f + b)),
            None => sigmoid(f),
        }
    }
}

/// Fitted meta-model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaModel {
    pub members: Vec<CalibratedMember>,
}

impl MetaModel {
    /// Check every member matches the expanded feature count
    pub fn validate(&self, n_features: usize) -> DetectResult<()> {
        if self.members.is_empty() {
            return Err(DetectError::Inference("meta-model has no members".to_string()));
        }
        for (i, member) in self.members.iter().enumerate() {
            if member.coef.len() != n_features {
                return Err(DetectError::Inference(format!(
                    "meta-model member {} has {} coefficients, expected {}",
                    i,
                    member.coef.len(),
                    n_features
                )));
            }
            let finite = member.coef.iter().all(|c| c.is_finite())
                && member.intercept.is_finite()
                && member
                    .calibrator
                    .map_or(true, |c| c.a.is_finite() && c.b.is_finite());
            if !finite {
                return Err(DetectError::Inference(format!(
                    "meta-model member {} has non-finite parameters",
                    i
                )));
            }
        }
        Ok(())
    }

    /// Mean calibrated positive-class probability across members
    pub fn predict_probability(&self, features: &[f64]) -> f64 {
        let total: f64 = self.members.iter().map(|m| m.probability(features)).sum();
        total / self.members.len() as f64
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
