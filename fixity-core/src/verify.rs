use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::digest::{hash_file, FileDigest, FileRecord};
use crate::error::ManifestError;
use crate::manifest::load_in;
use crate::storage::{LocalFs, Storage};

/// How a recomputed digest is compared with the recorded one.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    /// Bare hash against bare hash.
    #[default]
    Digest,
    /// The historical check: the recomputed `path: hash` line against the
    /// recorded bare hash. These never agree for a real path, so every
    /// non-empty manifest fails, consistently from run to run.
    Legacy,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct CheckOptions {
    pub comparison: Comparison,
}

impl CheckOptions {
    pub fn legacy() -> Self {
        Self { comparison: Comparison::Legacy }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub path: String,
    pub recorded: String,
    pub actual: FileDigest,
}

impl From<Mismatch> for ManifestError {
    fn from(m: Mismatch) -> Self {
        ManifestError::Mismatch { path: m.path, recorded: m.recorded, actual: m.actual.to_string() }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CheckReport {
    pub files_ok: u64,
    pub mismatches: Vec<Mismatch>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Re-hash one file and compare it with `recorded`.
fn compare<S: Storage + ?Sized>(
    storage: &S,
    path: &str,
    recorded: &str,
    options: CheckOptions,
) -> Option<Mismatch> {
    let record = FileRecord { path: path.to_string(), digest: hash_file(storage, Path::new(path)) };
    let agrees = match options.comparison {
        Comparison::Digest => record.digest.matches(recorded),
        Comparison::Legacy => record.entry() == recorded,
    };
    tracing::debug!(path, agrees, "checked file");
    if agrees {
        None
    } else {
        Some(Mismatch { path: record.path, recorded: recorded.to_string(), actual: record.digest })
    }
}

/// Verify every file listed in the manifest at `manifest_path`, stopping at
/// the first disagreement.
///
/// Files are visited in path order, so the reported mismatch is the
/// lexicographically first diverging path. Load errors are returned as-is.
pub fn check_in<S: Storage + ?Sized>(
    storage: &S,
    manifest_path: &Path,
    options: CheckOptions,
) -> Result<()> {
    let (by_path, _) = load_in(storage, manifest_path)?;
    for (path, recorded) in &by_path {
        if let Some(m) = compare(storage, path, recorded, options) {
            tracing::warn!(manifest = %manifest_path.display(), path = %m.path, "hash mismatch");
            return Err(ManifestError::from(m).into());
        }
    }
    Ok(())
}

pub fn check(manifest_path: impl AsRef<Path>) -> Result<()> {
    check_in(&LocalFs, manifest_path.as_ref(), CheckOptions::default())
}

pub fn check_with(manifest_path: impl AsRef<Path>, options: CheckOptions) -> Result<()> {
    check_in(&LocalFs, manifest_path.as_ref(), options)
}

/// Like [`check_in`] but visits every file and collects all mismatches.
pub fn audit_in<S: Storage + ?Sized>(
    storage: &S,
    manifest_path: &Path,
    options: CheckOptions,
) -> Result<CheckReport> {
    let (by_path, _) = load_in(storage, manifest_path)?;
    let mut report = CheckReport::default();
    for (path, recorded) in &by_path {
        match compare(storage, path, recorded, options) {
            Some(m) => report.mismatches.push(m),
            None => report.files_ok += 1,
        }
    }
    if !report.is_clean() {
        tracing::warn!(
            manifest = %manifest_path.display(),
            bad = report.mismatches.len(),
            ok = report.files_ok,
            "manifest audit found mismatches"
        );
    }
    Ok(report)
}

pub fn audit(manifest_path: impl AsRef<Path>, options: CheckOptions) -> Result<CheckReport> {
    audit_in(&LocalFs, manifest_path.as_ref(), options)
}
