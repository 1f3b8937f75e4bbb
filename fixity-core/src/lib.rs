//! Content-integrity manifests: hash files with SHA-256, record the digests in
//! a write-once `path: hash` manifest, and check files against it later.

pub mod codec;
pub mod digest;
pub mod error;
pub mod manifest;
pub mod storage;
pub mod verify;

pub use codec::{HashIndex, PathIndex};
pub use digest::{hash_files, FileDigest, FileRecord};
pub use error::ManifestError;
pub use manifest::{create, load, replace};
pub use storage::{LocalFs, MemFs, Storage};
pub use verify::{audit, check, check_with, CheckOptions, CheckReport, Comparison};
