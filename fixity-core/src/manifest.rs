use anyhow::Result;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::codec::{self, HashIndex, PathIndex};
use crate::error::ManifestError;
use crate::storage::{LocalFs, Storage};

/// Write `entries` to a new manifest at `filepath` and make it read-only.
///
/// The three steps fail with distinct errors ([`ManifestError::Create`],
/// [`ManifestError::Write`], [`ManifestError::ReadOnly`]). Nothing is rolled
/// back: a failed write can leave a partial, writable file behind.
pub fn create_in<S, E>(storage: &S, filepath: &Path, entries: &[E]) -> Result<()>
where
    S: Storage + ?Sized,
    E: AsRef<str>,
{
    write_sealed(storage, filepath, entries)?;
    tracing::info!(path = %filepath.display(), entries = entries.len(), "manifest created");
    Ok(())
}

pub fn create<E: AsRef<str>>(filepath: impl AsRef<Path>, entries: &[E]) -> Result<()> {
    create_in(&LocalFs, filepath.as_ref(), entries)
}

fn write_sealed<S, E>(storage: &S, filepath: &Path, entries: &[E]) -> Result<(), ManifestError>
where
    S: Storage + ?Sized,
    E: AsRef<str>,
{
    {
        let mut f = storage
            .create(filepath)
            .map_err(|source| ManifestError::Create { path: filepath.to_path_buf(), source })?;
        f.write_all(codec::render(entries).as_bytes())
            .and_then(|()| f.flush())
            .map_err(|source| ManifestError::Write { path: filepath.to_path_buf(), source })?;
    }
    storage
        .set_readonly(filepath)
        .map_err(|source| ManifestError::ReadOnly { path: filepath.to_path_buf(), source })
}

/// Sibling path used while a replacement manifest is being built.
pub fn staging_path(filepath: &Path) -> PathBuf {
    let mut name = OsString::from(filepath.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Swap the manifest at `filepath` for one holding `entries`.
///
/// The new manifest is sealed at [`staging_path`] first and then renamed over
/// `filepath`, so readers see either the old or the new content in full. The
/// staging path belongs to this function: a leftover file there (sealed by an
/// earlier interrupted replace) is removed before staging starts, and the
/// staging file is removed again if any later step fails.
pub fn replace_in<S, E>(storage: &S, filepath: &Path, entries: &[E]) -> Result<()>
where
    S: Storage + ?Sized,
    E: AsRef<str>,
{
    let staging = staging_path(filepath);
    if storage.exists(&staging) {
        tracing::debug!(path = %staging.display(), "removing stale staging manifest");
        storage
            .remove_file(&staging)
            .map_err(|source| ManifestError::Create { path: staging.clone(), source })?;
    }
    let swapped = write_sealed(storage, &staging, entries).and_then(|()| {
        storage.rename(&staging, filepath).map_err(|source| ManifestError::Rename {
            from: staging.clone(),
            to: filepath.to_path_buf(),
            source,
        })
    });
    if let Err(err) = swapped {
        if let Err(cleanup) = storage.remove_file(&staging) {
            tracing::debug!(path = %staging.display(), %cleanup, "staging manifest not removed");
        }
        return Err(err.into());
    }
    tracing::info!(path = %filepath.display(), entries = entries.len(), "manifest replaced");
    Ok(())
}

pub fn replace<E: AsRef<str>>(filepath: impl AsRef<Path>, entries: &[E]) -> Result<()> {
    replace_in(&LocalFs, filepath.as_ref(), entries)
}

/// Parse the manifest at `path` into its path and hash indices.
///
/// A missing manifest is reported as [`ManifestError::Missing`], which callers
/// usually treat as "nothing recorded yet".
pub fn load_in<S: Storage + ?Sized>(storage: &S, path: &Path) -> Result<(PathIndex, HashIndex)> {
    if !storage.exists(path) {
        return Err(ManifestError::Missing { path: path.to_path_buf() }.into());
    }
    let content = read_all(storage, path).map_err(|source| {
        tracing::warn!(path = %path.display(), err = %source, "failed to read manifest");
        ManifestError::Read { path: path.to_path_buf(), source }
    })?;
    Ok(codec::parse_bytes(&content))
}

pub fn load(path: impl AsRef<Path>) -> Result<(PathIndex, HashIndex)> {
    load_in(&LocalFs, path.as_ref())
}

fn read_all<S: Storage + ?Sized>(storage: &S, path: &Path) -> std::io::Result<Vec<u8>> {
    let mut content = Vec::new();
    storage.open_read(path)?.read_to_end(&mut content)?;
    Ok(content)
}
