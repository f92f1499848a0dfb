//! Base Classifiers
//!
//! Two independently trained image classifiers, each producing the
//! probability that an image is synthetic.
//!
//! - **A**: ResNet-50 fine-tune, ImageNet normalisation
//! - **B**: ViT "ai vs real" classifier, 0.5/0.5 normalisation
//!
//! Classifiers are loaded once at startup and are read-only afterwards; any
//! number of requests may call `predict` concurrently.

pub mod onnx;
pub mod preprocess;

pub use onnx::OnnxClassifier;
pub use preprocess::PreprocessRecipe;

use crate::error::{DetectError, DetectResult};
use crate::types::{BaseScore, SourceId};
use image::RgbImage;

/// Base classifier contract
pub trait BaseClassifier: Send + Sync {
    /// Position of this classifier in the fusion input
    fn source_id(&self) -> SourceId;

    /// Human-readable name for logs
    fn name(&self) -> &str;

    /// Probability that `image` is synthetic
    ///
    /// # Errors
    /// Returns `DetectError::Inference` if the model cannot be evaluated.
    fn predict(&self, image: &RgbImage) -> DetectResult<BaseScore>;
}

/// Softmax probability of `class_index`, computed in f64
pub fn softmax_probability(logits: &[f32], class_index: usize) -> DetectResult<f64> {
    if class_index >= logits.len() {
        return Err(DetectError::Inference(format!(
            "class index {} out of range for {} logits",
            class_index,
            logits.len()
        )));
    }
    if logits.iter().any(|l| !l.is_finite()) {
        return Err(DetectError::Inference("non-finite logits".to_string()));
    }

    let max = logits
        .iter()
        .map(|&l| l as f64)
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    Ok(exps[class_index] / total)
}
