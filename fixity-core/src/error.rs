use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Root causes carried inside the `anyhow::Error`s returned by this crate.
///
/// Callers that need to tell the soft "no manifest yet" case apart from real
/// failures can `downcast_ref::<ManifestError>()`.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("{} does not exist", .path.display())]
    Missing { path: PathBuf },

    #[error("failed to read manifest {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to create {}: {source}", .path.display())]
    Create { path: PathBuf, source: io::Error },

    #[error("failed to write to {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to set manifest {} to read only: {source}", .path.display())]
    ReadOnly { path: PathBuf, source: io::Error },

    #[error("failed to move manifest into place ({} -> {}): {source}", .from.display(), .to.display())]
    Rename { from: PathBuf, to: PathBuf, source: io::Error },

    #[error("hashes differ (record: {recorded}; actual: {actual})")]
    Mismatch { path: String, recorded: String, actual: String },
}

impl ManifestError {
    /// True for [`ManifestError::Missing`].
    pub fn is_missing(&self) -> bool {
        matches!(self, ManifestError::Missing { .. })
    }

    /// True when `err`'s root cause is a missing manifest.
    pub fn is_missing_err(err: &anyhow::Error) -> bool {
        err.downcast_ref::<ManifestError>().map(ManifestError::is_missing).unwrap_or(false)
    }
}
