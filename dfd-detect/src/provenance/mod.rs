//! Provenance Layer
//!
//! Checks an image for an embedded C2PA content-provenance manifest and
//! reports presence, validity, issuer and whether the manifest declares the
//! image as generated by a trained model.
//!
//! # Availability
//! Reading manifests needs the `c2pa` cargo feature. Without it the checker
//! reports `available: false` and the pipeline carries on with the ensemble.
//!
//! # Error Handling
//! Nothing here fails the request: a missing manifest is a normal negative
//! result, a malformed one becomes `present: false` with an `error` message.

pub mod manifest;

#[cfg(feature = "c2pa")]
mod c2pa_reader;

use crate::error::{DetectError, DetectResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of a provenance check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    /// Provenance support exists on this platform
    pub available: bool,
    /// A manifest store with an active manifest was found
    pub present: bool,
    /// No validation errors were reported (absent when not present)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    /// Signing certificate issuer (absent when not present)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Active manifest declares trained algorithmic media (absent when not present)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_generated_signal: Option<bool>,
    /// Full manifest store document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ManifestRecord {
    /// Provenance support missing on this platform
    pub fn unavailable() -> Self {
        Self {
            available: false,
            present: false,
            valid: None,
            issuer: None,
            ai_generated_signal: None,
            raw: None,
            error: None,
            message: Some("C2PA support not available on this platform".to_string()),
        }
    }

    /// Normal negative result
    pub fn not_present(message: impl Into<String>) -> Self {
        Self {
            available: true,
            message: Some(message.into()),
            ..Self::unavailable()
        }
    }

    /// Manifest could not be read or parsed
    pub fn parse_failure(error: impl Into<String>) -> Self {
        Self {
            available: true,
            message: None,
            error: Some(error.into()),
            ..Self::unavailable()
        }
    }

    /// Cryptographic proof of synthetic origin
    pub fn proves_synthetic(&self) -> bool {
        self.present && self.ai_generated_signal == Some(true)
    }
}

/// Source of raw manifest-store JSON for an image
///
/// Implementations must be cheap to share: one instance serves every request.
pub trait ManifestSource: Send + Sync {
    /// Provenance support exists on this platform
    fn is_available(&self) -> bool;

    /// Read the manifest store embedded in `path`
    ///
    /// # Returns
    /// * `Ok(Some(json))` - manifest store found
    /// * `Ok(None)` - image carries no manifest
    /// * `Err(_)` - manifest exists but could not be read
    fn read_store(&self, path: &Path) -> DetectResult<Option<String>>;
}

/// Manifest source for builds without C2PA support
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedSource;

impl ManifestSource for UnsupportedSource {
    fn is_available(&self) -> bool {
        false
    }

    fn read_store(&self, _path: &Path) -> DetectResult<Option<String>> {
        Err(DetectError::PlatformUnavailable(
            "built without the c2pa feature".to_string(),
        ))
    }
}

/// Best manifest source this build supports
#[cfg(feature = "c2pa")]
pub fn platform_source() -> Box<dyn ManifestSource> {
    Box::new(c2pa_reader::C2paSource)
}

/// Best manifest source this build supports
#[cfg(not(feature = "c2pa"))]
pub fn platform_source() -> Box<dyn ManifestSource> {
    Box::new(UnsupportedSource)
}

/// Provenance checker
pub struct ProvenanceChecker {
    source: Box<dyn ManifestSource>,
}

impl ProvenanceChecker {
    /// Checker backed by the platform's manifest source
    pub fn new() -> Self {
        Self::with_source(platform_source())
    }

    /// Checker backed by a specific manifest source
    pub fn with_source(source: Box<dyn ManifestSource>) -> Self {
        Self { source }
    }

    pub fn is_available(&self) -> bool {
        self.source.is_available()
    }

    /// Check `path` for a provenance manifest
    ///
    /// Never fails: every error path is folded into the returned record.
    pub fn check(&self, path: &Path) -> ManifestRecord {
        if !self.source.is_available() {
            debug!(path = %path.display(), "Provenance check skipped: subsystem unavailable");
            return ManifestRecord::unavailable();
        }

        let record = match self.source.read_store(path) {
            Ok(None) => ManifestRecord::not_present("No C2PA manifest found"),
            Ok(Some(json)) => manifest::interpret_store(&json).unwrap_or_else(|e| {
                warn!(path = %path.display(), "Manifest could not be parsed: {}", e);
                ManifestRecord::parse_failure(e.to_string())
            }),
            Err(DetectError::PlatformUnavailable(reason)) => {
                debug!(%reason, "Provenance source reported unavailable");
                ManifestRecord::unavailable()
            }
            Err(e) => {
                warn!(path = %path.display(), "Manifest could not be read: {}", e);
                ManifestRecord::parse_failure(e.to_string())
            }
        };

        debug!(
            path = %path.display(),
            present = record.present,
            ai_generated_signal = ?record.ai_generated_signal,
            "Provenance check complete"
        );
        record
    }
}

impl Default for ProvenanceChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(DetectResult<Option<String>>);

    impl ManifestSource for FixedSource {
        fn is_available(&self) -> bool {
            true
        }

        fn read_store(&self, _path: &Path) -> DetectResult<Option<String>> {
            match &self.0 {
                Ok(v) => Ok(v.clone()),
                Err(e) => Err(DetectError::ManifestParse(e.to_string())),
            }
        }
    }

    #[test]
    fn test_unsupported_source_reports_unavailable() {
        let checker = ProvenanceChecker::with_source(Box::new(UnsupportedSource));
        let record = checker.check(Path::new("image.png"));

        assert!(!record.available);
        assert!(!record.present);
        assert!(record.error.is_none());
        assert!(!checker.is_available());
    }

    #[test]
    fn test_no_manifest_is_normal_negative() {
        let checker = ProvenanceChecker::with_source(Box::new(FixedSource(Ok(None))));
        let record = checker.check(Path::new("image.png"));

        assert!(record.available);
        assert!(!record.present);
        assert!(record.error.is_none());
        assert_eq!(record.message.as_deref(), Some("No C2PA manifest found"));
    }

    #[test]
    fn test_read_error_folds_into_record() {
        let checker = ProvenanceChecker::with_source(Box::new(FixedSource(Err(
            DetectError::ManifestParse("bad JUMBF box".to_string()),
        ))));
        let record = checker.check(Path::new("image.jpg"));

        assert!(record.available);
        assert!(!record.present);
        assert!(record.error.as_deref().unwrap().contains("bad JUMBF box"));
        assert_eq!(record.valid, None);
        assert_eq!(record.issuer, None);
    }

    #[test]
    fn test_malformed_json_folds_into_record() {
        let checker = ProvenanceChecker::with_source(Box::new(FixedSource(Ok(Some(
            "not json".to_string(),
        )))));
        let record = checker.check(Path::new("image.jpg"));

        assert!(!record.present);
        assert!(record.error.is_some());
    }

    #[test]
    fn test_negative_records_omit_manifest_fields() {
        for record in [
            ManifestRecord::not_present("none"),
            ManifestRecord::parse_failure("bad box"),
            ManifestRecord::unavailable(),
        ] {
            let value = serde_json::to_value(&record).unwrap();
            let object = value.as_object().unwrap();

            assert_eq!(object["present"], false);
            for key in ["valid", "issuer", "ai_generated_signal"] {
                assert!(!object.contains_key(key), "{} serialised in {}", key, value);
            }
            assert!(!record.proves_synthetic());
        }
    }

    #[test]
    fn test_signal_requires_present_manifest() {
        let record = ManifestRecord {
            ai_generated_signal: Some(true),
            ..ManifestRecord::not_present("none")
        };
        assert!(!record.proves_synthetic());

        let present = ManifestRecord {
            present: true,
            ..record
        };
        assert!(present.proves_synthetic());
    }
}
