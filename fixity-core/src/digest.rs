use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::path::Path;

use crate::codec;
use crate::storage::{LocalFs, Storage};

/// Length of a hex-encoded SHA-256 digest.
pub const HEX_LEN: usize = 64;

/// Outcome of hashing one file.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileDigest {
    /// Lowercase hex SHA-256 of the full content.
    Available(String),
    /// The file could not be opened or read.
    Unavailable,
}

impl FileDigest {
    pub fn as_hex(&self) -> Option<&str> {
        match self {
            FileDigest::Available(hex) => Some(hex),
            FileDigest::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, FileDigest::Available(_))
    }

    /// Whether this digest equals a hash read back from a manifest.
    /// `Unavailable` never matches, not even an empty recorded hash.
    pub fn matches(&self, recorded: &str) -> bool {
        self.as_hex().map(|hex| hex == recorded).unwrap_or(false)
    }
}

/// Renders as the manifest text form: the hex digest, or nothing.
impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_hex().unwrap_or(""))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub digest: FileDigest,
}

impl FileRecord {
    /// `path: hash`, the manifest line for this record.
    pub fn entry(&self) -> String {
        codec::format_entry(&self.path, &self.digest)
    }
}

fn sha256_hex<S: Storage + ?Sized>(storage: &S, path: &Path) -> io::Result<String> {
    let mut reader = storage.open_read(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Hash the full content of `path`. Never fails: unreadable files come back
/// as [`FileDigest::Unavailable`].
pub fn hash_file<S: Storage + ?Sized>(storage: &S, path: &Path) -> FileDigest {
    match sha256_hex(storage, path) {
        Ok(hex) => FileDigest::Available(hex),
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "hash unavailable");
            FileDigest::Unavailable
        }
    }
}

/// One record per input path, in input order.
pub fn hash_records<S, P>(storage: &S, paths: &[P]) -> Vec<FileRecord>
where
    S: Storage + ?Sized,
    P: AsRef<str>,
{
    paths
        .iter()
        .map(|p| {
            let path = p.as_ref();
            FileRecord { path: path.to_string(), digest: hash_file(storage, Path::new(path)) }
        })
        .collect()
}

/// `path: hash` lines for `paths`, in input order.
pub fn hash_files_in<S, P>(storage: &S, paths: &[P]) -> Vec<String>
where
    S: Storage + ?Sized,
    P: AsRef<str>,
{
    hash_records(storage, paths).iter().map(FileRecord::entry).collect()
}

/// [`hash_files_in`] on the local disk.
pub fn hash_files<P: AsRef<str>>(paths: &[P]) -> Vec<String> {
    hash_files_in(&LocalFs, paths)
}
