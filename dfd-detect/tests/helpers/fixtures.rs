//! Fake collaborators and fixture builders for pipeline tests

use dfd_detect::classifiers::{BaseClassifier, PreprocessRecipe};
use dfd_detect::config::StagingConfig;
use dfd_detect::context::{EnsembleCapability, EnsembleModels, InferenceContext};
use dfd_detect::fusion::{CalibratedMember, MetaModel, PolynomialTransform, ScoreFusion};
use dfd_detect::provenance::{ManifestSource, ProvenanceChecker, UnsupportedSource};
use dfd_detect::types::{BaseScore, SourceId};
use dfd_detect::{DetectError, DetectResult, StagedImage};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Classifiers
// ============================================================================

/// Classifier returning a fixed score, counting calls
pub struct FakeClassifier {
    id: SourceId,
    probability: f64,
    delay: Option<Duration>,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl FakeClassifier {
    pub fn new(id: SourceId, probability: f64) -> Self {
        Self {
            id,
            probability,
            delay: None,
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl BaseClassifier for FakeClassifier {
    fn source_id(&self) -> SourceId {
        self.id
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn predict(&self, _image: &RgbImage) -> DetectResult<BaseScore> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            return Err(DetectError::Inference("fake classifier failure".to_string()));
        }
        Ok(BaseScore::new(self.id, self.probability))
    }
}

/// Classifier whose score depends on the preprocessed pixels
///
/// Exercises the real preprocessing path so runs can be compared bit for bit.
pub struct PixelStatClassifier {
    pub id: SourceId,
    pub recipe: PreprocessRecipe,
}

impl BaseClassifier for PixelStatClassifier {
    fn source_id(&self) -> SourceId {
        self.id
    }

    fn name(&self) -> &str {
        "pixel-stat"
    }

    fn predict(&self, image: &RgbImage) -> DetectResult<BaseScore> {
        let data = self.recipe.apply(image);
        let mean = data.iter().map(|&v| v as f64).sum::<f64>() / data.len() as f64;
        Ok(BaseScore::new(self.id, 1.0 / (1.0 + (-mean).exp())))
    }
}

// ============================================================================
// Fusion
// ============================================================================

/// Fusion model weighting A much more heavily than B
pub fn asymmetric_fusion() -> ScoreFusion {
    ScoreFusion::new(
        PolynomialTransform::standard(2, 2, true),
        MetaModel {
            members: vec![CalibratedMember {
                coef: vec![0.0, 5.0, 0.5, 1.0, 0.8, -0.3],
                intercept: -3.0,
                calibrator: None,
            }],
        },
    )
    .unwrap()
}

/// Fusion model that outputs `probability` for every input
pub fn constant_fusion(probability: f64) -> ScoreFusion {
    ScoreFusion::new(
        PolynomialTransform::standard(2, 2, true),
        MetaModel {
            members: vec![CalibratedMember {
                coef: vec![0.0; 6],
                intercept: (probability / (1.0 - probability)).ln(),
                calibrator: None,
            }],
        },
    )
    .unwrap()
}

pub fn ensemble(
    a: impl BaseClassifier + 'static,
    b: impl BaseClassifier + 'static,
    fusion: ScoreFusion,
) -> EnsembleCapability {
    EnsembleCapability::Ready(Arc::new(
        EnsembleModels::new(Box::new(a), Box::new(b), fusion).unwrap(),
    ))
}

// ============================================================================
// Provenance
// ============================================================================

/// Manifest source returning a fixed document
pub struct StaticManifestSource {
    json: Option<String>,
}

impl StaticManifestSource {
    pub fn none() -> Self {
        Self { json: None }
    }

    pub fn with_json(json: String) -> Self {
        Self { json: Some(json) }
    }
}

impl ManifestSource for StaticManifestSource {
    fn is_available(&self) -> bool {
        true
    }

    fn read_store(&self, _path: &Path) -> DetectResult<Option<String>> {
        Ok(self.json.clone())
    }
}

/// Manifest store whose active manifest carries `digital_source_type`
pub fn manifest_json(digital_source_type: &str) -> String {
    serde_json::json!({
        "active_manifest": "urn:c2pa:test",
        "manifests": {
            "urn:c2pa:test": {
                "signature_info": {"issuer": "Test Generator Inc."},
                "assertions": [{
                    "label": "c2pa.actions",
                    "data": {"actions": [{
                        "action": "c2pa.created",
                        "digitalSourceType": digital_source_type
                    }]}
                }]
            }
        },
        "validation_status": []
    })
    .to_string()
}

pub fn ai_manifest_checker() -> ProvenanceChecker {
    ProvenanceChecker::with_source(Box::new(StaticManifestSource::with_json(manifest_json(
        "http://cv.iptc.org/newscodes/digitalsourcetype/trainedAlgorithmicMedia",
    ))))
}

pub fn no_manifest_checker() -> ProvenanceChecker {
    ProvenanceChecker::with_source(Box::new(StaticManifestSource::none()))
}

pub fn unavailable_checker() -> ProvenanceChecker {
    ProvenanceChecker::with_source(Box::new(UnsupportedSource))
}

pub fn context(provenance: ProvenanceChecker, ensemble: EnsembleCapability) -> Arc<InferenceContext> {
    Arc::new(InferenceContext::new(provenance, ensemble))
}

// ============================================================================
// Images
// ============================================================================

pub fn staging_config(dir: &Path) -> StagingConfig {
    StagingConfig {
        directory: dir.join("uploads"),
        ..StagingConfig::default()
    }
}

/// Write a small gradient PNG and return its path
pub fn write_test_png(dir: &Path, name: &str) -> PathBuf {
    let image = RgbImage::from_fn(32, 24, |x, y| Rgb([(x * 8) as u8, (y * 10) as u8, 90]));
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

/// Stage a fresh test PNG
pub fn stage_test_png(dir: &Path) -> StagedImage {
    let source = write_test_png(dir, "sample.png");
    StagedImage::stage_file(&staging_config(dir), &source).unwrap()
}

/// Files left in the staging directory
pub fn staged_files(dir: &Path) -> usize {
    std::fs::read_dir(dir.join("uploads"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}
