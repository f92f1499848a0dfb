//! Per-request image staging
//!
//! Every analysis works on a private copy of the image in the staging
//! directory. `StagedImage` owns that copy and deletes it exactly once: either
//! through `release` or, on any other exit path (early return, panic), in
//! `Drop`. Cleanup failures are logged and never reach the caller.

use crate::config::StagingConfig;
use crate::error::{DetectError, DetectResult};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Staged copy of one request's image
#[derive(Debug)]
pub struct StagedImage {
    path: PathBuf,
    filename: String,
    released: bool,
}

impl StagedImage {
    /// Stage uploaded bytes under a sanitised, request-unique name
    ///
    /// # Errors
    /// `DetectError::InvalidInput` for an unusable name, a disallowed extension
    /// or an oversized/empty payload; `DetectError::Io` if the copy fails.
    pub fn stage_bytes(config: &StagingConfig, original_name: &str, bytes: &[u8]) -> DetectResult<Self> {
        let filename = secure_filename(original_name);
        if filename.is_empty() {
            return Err(DetectError::InvalidInput("No file selected".to_string()));
        }
        ensure_allowed_extension(config, &filename)?;

        if bytes.is_empty() {
            return Err(DetectError::InvalidInput(format!("{} is empty", filename)));
        }
        if bytes.len() as u64 > config.max_bytes {
            return Err(DetectError::InvalidInput(format!(
                "{} is {} bytes, limit is {}",
                filename,
                bytes.len(),
                config.max_bytes
            )));
        }

        std::fs::create_dir_all(&config.directory)?;
        let path = config
            .directory
            .join(format!("{}-{}", Uuid::new_v4().simple(), filename));
        std::fs::write(&path, bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), "Image staged");

        Ok(Self {
            path,
            filename,
            released: false,
        })
    }

    /// Stage a copy of an existing file; the original is never touched
    pub fn stage_file(config: &StagingConfig, source: &Path) -> DetectResult<Self> {
        let size = std::fs::metadata(source)?.len();
        if size > config.max_bytes {
            return Err(DetectError::InvalidInput(format!(
                "{} is {} bytes, limit is {}",
                source.display(),
                size,
                config.max_bytes
            )));
        }
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = std::fs::read(source)?;
        Self::stage_bytes(config, &name, &bytes)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sanitised original file name
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Delete the staged copy
    ///
    /// A copy that is already gone counts as released.
    pub fn release(mut self) -> DetectResult<()> {
        self.released = true;
        remove_staged(&self.path)
    }
}

impl Drop for StagedImage {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = remove_staged(&self.path) {
            warn!("{}", e);
        }
    }
}

fn remove_staged(path: &Path) -> DetectResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Staged image released");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DetectError::ResourceCleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn ensure_allowed_extension(config: &StagingConfig, filename: &str) -> DetectResult<()> {
    let extension = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());
    match extension {
        Some(ext) if config.allowed_extensions.iter().any(|a| a.eq_ignore_ascii_case(&ext)) => Ok(()),
        _ => Err(DetectError::InvalidInput(format!(
            "File type not allowed: {} (accepted: {})",
            filename,
            config.allowed_extensions.join(", ")
        ))),
    }
}

/// Reduce a client-supplied name to a safe single path component
///
/// Accented letters are folded to ASCII through NFKD. Keeps ASCII letters,
/// digits, `.`, `_` and `-`; whitespace becomes `_`; directory parts and
/// leading dots/underscores are dropped.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .nfkd()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}
