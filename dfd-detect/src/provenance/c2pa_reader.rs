//! Manifest source backed by the `c2pa` crate

use super::ManifestSource;
use crate::error::{DetectError, DetectResult};
use std::path::Path;

/// Reads embedded manifest stores with `c2pa::Reader`
#[derive(Debug, Default, Clone, Copy)]
pub struct C2paSource;

impl ManifestSource for C2paSource {
    fn is_available(&self) -> bool {
        true
    }

    fn read_store(&self, path: &Path) -> DetectResult<Option<String>> {
        match c2pa::Reader::from_file(path) {
            Ok(reader) => Ok(Some(reader.json())),
            // No JUMBF data at all: the image simply carries no manifest
            Err(c2pa::Error::JumbfNotFound) | Err(c2pa::Error::ProvenanceMissing) => Ok(None),
            Err(e) => Err(DetectError::ManifestParse(e.to_string())),
        }
    }
}

#[cfg(all(test, feature = "c2pa"))]
mod tests {
    use super::*;
    use crate::provenance::ProvenanceChecker;
    use image::{Rgb, RgbImage};

    fn plain_png(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("camera.png");
        RgbImage::from_pixel(16, 16, Rgb([40, 80, 120]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_image_without_manifest_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = plain_png(dir.path());

        let store = C2paSource.read_store(&path).unwrap();
        assert_eq!(store, None);
    }

    #[test]
    fn test_checker_reports_plain_image_as_not_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = plain_png(dir.path());

        let checker = ProvenanceChecker::with_source(Box::new(C2paSource));
        let record = checker.check(&path);

        assert!(checker.is_available());
        assert!(record.available);
        assert!(!record.present);
        assert!(record.error.is_none());
        assert_eq!(record.ai_generated_signal, None);
        assert!(!record.proves_synthetic());
    }
}
