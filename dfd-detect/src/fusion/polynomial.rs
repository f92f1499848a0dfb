//! Fitted polynomial feature expansion
//!
//! Mirrors a fitted `PolynomialFeatures` transform: each output feature is the
//! product of the inputs raised to one row of the `powers` matrix. For two
//! inputs at degree 2 with bias the expansion is `[1, a, b, a², ab, b²]`.

use crate::error::{DetectError, DetectResult};
use serde::{Deserialize, Serialize};

/// Number of base scores the fusion model consumes
pub const FUSION_INPUTS: usize = 2;

/// Expansion degree the fusion model was fitted with
pub const FUSION_DEGREE: u32 = 2;

/// Fitted polynomial transform artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialTransform {
    pub n_features_in: usize,
    pub degree: u32,
    pub include_bias: bool,
    /// One row per output feature, one exponent per input
    pub powers: Vec<Vec<u32>>,
}

impl PolynomialTransform {
    /// Standard full expansion over `n_features_in` inputs up to `degree`
    ///
    /// Terms are ordered by total degree, then lexicographically with earlier
    /// inputs carrying higher exponents (a², ab, b²).
    pub fn standard(n_features_in: usize, degree: u32, include_bias: bool) -> Self {
        let mut powers = Vec::new();
        let start = if include_bias { 0 } else { 1 };
        for total in start..=degree {
            let mut row = vec![0; n_features_in];
            push_terms(&mut powers, &mut row, 0, total);
        }
        Self {
            n_features_in,
            degree,
            include_bias,
            powers,
        }
    }

    /// Check the artifact matches what the fusion model expects
    pub fn validate(&self) -> DetectResult<()> {
        if self.n_features_in != FUSION_INPUTS {
            return Err(DetectError::Inference(format!(
                "polynomial transform expects {} inputs, fusion provides {}",
                self.n_features_in, FUSION_INPUTS
            )));
        }
        if self.degree != FUSION_DEGREE {
            return Err(DetectError::Inference(format!(
                "polynomial transform has degree {}, expected {}",
                self.degree, FUSION_DEGREE
            )));
        }
        if self.powers.is_empty() {
            return Err(DetectError::Inference("polynomial transform has no terms".to_string()));
        }
        for row in &self.powers {
            if row.len() != self.n_features_in {
                return Err(DetectError::Inference(format!(
                    "power row {:?} does not match {} inputs",
                    row, self.n_features_in
                )));
            }
            if row.iter().sum::<u32>() > self.degree {
                return Err(DetectError::Inference(format!(
                    "power row {:?} exceeds degree {}",
                    row, self.degree
                )));
            }
        }
        Ok(())
    }

    pub fn n_output_features(&self) -> usize {
        self.powers.len()
    }

    /// Expand one input vector
    pub fn transform(&self, input: &[f64]) -> DetectResult<Vec<f64>> {
        if input.len() != self.n_features_in {
            return Err(DetectError::Inference(format!(
                "expected {} fusion inputs, got {}",
                self.n_features_in,
                input.len()
            )));
        }

        Ok(self
            .powers
            .iter()
            .map(|row| {
                row.iter()
                    .zip(input)
                    .map(|(&power, &value)| value.powi(power as i32))
                    .product()
            })
            .collect())
    }
}

fn push_terms(out: &mut Vec<Vec<u32>>, row: &mut Vec<u32>, index: usize, remaining: u32) {
    if index == row.len() - 1 {
        row[index] = remaining;
        out.push(row.clone());
        row[index] = 0;
        return;
    }
    for power in (0..=remaining).rev() {
        row[index] = power;
        push_terms(out, row, index + 1, remaining - power);
    }
    row[index] = 0;
}
