//! C2PA manifest store interpretation
//!
//! Reads the manifest-store JSON produced by a C2PA reader and reduces it to a
//! `ManifestRecord`. Only the fields the detector needs are modelled; the full
//! document is kept as `raw`.

use super::ManifestRecord;
use crate::error::{DetectError, DetectResult};
use serde::Deserialize;
use std::collections::HashMap;

/// Assertion label carrying the action history
pub const ACTIONS_ASSERTION: &str = "c2pa.actions";

/// Digital source type marker for generative-AI output
///
/// Matched as a substring so both the IPTC URI form
/// (`http://cv.iptc.org/newscodes/digitalsourcetype/trainedAlgorithmicMedia`)
/// and the bare term are recognised.
pub const TRAINED_ALGORITHMIC_MEDIA: &str = "trainedAlgorithmicMedia";

#[derive(Debug, Deserialize)]
struct ManifestStore {
    #[serde(default)]
    active_manifest: Option<String>,
    #[serde(default)]
    manifests: HashMap<String, Manifest>,
    #[serde(default)]
    validation_status: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    #[serde(default)]
    signature_info: Option<SignatureInfo>,
    #[serde(default)]
    assertions: Vec<Assertion>,
}

#[derive(Debug, Deserialize)]
struct SignatureInfo {
    #[serde(default)]
    issuer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Assertion {
    #[serde(default)]
    label: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct ActionsData {
    #[serde(default)]
    actions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
struct Action {
    #[serde(default, rename = "digitalSourceType")]
    digital_source_type: Option<String>,
}

impl Manifest {
    /// True if any `c2pa.actions` assertion declares trained algorithmic media
    fn declares_ai_generation(&self) -> bool {
        self.assertions
            .iter()
            .filter(|a| a.label == ACTIONS_ASSERTION)
            .filter_map(|a| serde_json::from_value::<ActionsData>(a.data.clone()).ok())
            .flat_map(|data| data.actions)
            .any(|action| {
                action
                    .digital_source_type
                    .as_deref()
                    .is_some_and(|t| t.contains(TRAINED_ALGORITHMIC_MEDIA))
            })
    }
}

/// Interpret a manifest-store JSON document
///
/// # Errors
/// Returns `DetectError::ManifestParse` if the document is not valid JSON or
/// does not have the manifest-store shape. Callers fold this into the record.
pub fn interpret_store(json: &str) -> DetectResult<ManifestRecord> {
    if json.trim().is_empty() {
        return Ok(ManifestRecord::not_present("No C2PA manifest found"));
    }

    let raw: serde_json::Value =
        serde_json::from_str(json).map_err(|e| DetectError::ManifestParse(e.to_string()))?;
    let store: ManifestStore = serde_json::from_value(raw.clone())
        .map_err(|e| DetectError::ManifestParse(e.to_string()))?;

    let Some(active_label) = store.active_manifest.as_deref() else {
        return Ok(ManifestRecord::not_present(
            "Manifest store exists but no active manifest.",
        ));
    };

    // A dangling active label still proves a manifest store exists; it just
    // carries no issuer or assertions.
    let fallback = Manifest::default();
    let active = store.manifests.get(active_label).unwrap_or_else(|| {
        tracing::debug!(label = active_label, "Active manifest label not found in store");
        &fallback
    });

    let issuer = active
        .signature_info
        .as_ref()
        .and_then(|s| s.issuer.clone());

    Ok(ManifestRecord {
        available: true,
        present: true,
        valid: Some(store.validation_status.is_empty()),
        issuer,
        ai_generated_signal: Some(active.declares_ai_generation()),
        raw: Some(raw),
        error: None,
        message: None,
    })
}
