//! ONNX-backed base classifier
//!
//! Runs an exported image classifier with `tract-onnx`. The model takes one
//! NCHW `f32` image and returns `[1, n_classes]` logits; the synthetic
//! probability is the softmax mass on the configured class index.

use super::{softmax_probability, BaseClassifier, PreprocessRecipe};
use crate::error::{DetectError, DetectResult};
use crate::types::{BaseScore, SourceId};
use image::RgbImage;
use std::path::Path;
use tracing::{debug, info};
use tract_onnx::prelude::*;

type Plan = TypedRunnableModel<TypedModel>;

/// Base classifier loaded from an ONNX file
pub struct OnnxClassifier {
    source_id: SourceId,
    name: String,
    recipe: PreprocessRecipe,
    synthetic_class_index: usize,
    plan: Plan,
}

impl OnnxClassifier {
    /// Load and optimise an ONNX classifier
    ///
    /// Expensive; called once per classifier at startup.
    ///
    /// # Errors
    /// Returns `DetectError::ModelLoad` if the file is missing or the graph
    /// cannot be typed for the recipe's input shape.
    pub fn load(
        source_id: SourceId,
        name: impl Into<String>,
        path: &Path,
        recipe: PreprocessRecipe,
        synthetic_class_index: usize,
    ) -> DetectResult<Self> {
        let name = name.into();
        if !path.is_file() {
            return Err(DetectError::model_load(path, "file not found"));
        }

        info!(classifier = %name, path = %path.display(), "Loading ONNX classifier");
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact(recipe.input_shape()).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| DetectError::model_load(path, format!("{:#}", e)))?;

        info!(classifier = %name, source = %source_id, "Classifier loaded");
        Ok(Self {
            source_id,
            name,
            recipe,
            synthetic_class_index,
            plan,
        })
    }
}

impl BaseClassifier for OnnxClassifier {
    fn source_id(&self) -> SourceId {
        self.source_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, image: &RgbImage) -> DetectResult<BaseScore> {
        let data = self.recipe.apply(image);
        let input = Tensor::from_shape(&self.recipe.input_shape(), &data)
            .map_err(|e| DetectError::Inference(format!("{}: input tensor: {:#}", self.name, e)))?;

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| DetectError::Inference(format!("{}: {:#}", self.name, e)))?;

        let output = outputs
            .first()
            .ok_or_else(|| DetectError::Inference(format!("{}: model produced no output", self.name)))?;
        let logits: Vec<f32> = output
            .to_array_view::<f32>()
            .map_err(|e| DetectError::Inference(format!("{}: logits: {:#}", self.name, e)))?
            .iter()
            .copied()
            .collect();

        let probability = softmax_probability(&logits, self.synthetic_class_index)?;
        debug!(classifier = %self.name, probability, "Classifier scored image");
        Ok(BaseScore::new(self.source_id, probability))
    }
}
