use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// File access used by the hasher, the manifest writer and the loader.
///
/// Every handle returned here is an owned value, so it is closed when the
/// caller drops it, on error paths included.
pub trait Storage {
    fn exists(&self, path: &Path) -> bool;

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;

    /// Create `path`, truncating it if it already exists.
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>>;

    /// Remove every write bit from `path`.
    fn set_readonly(&self, path: &Path) -> io::Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Delete `path`. Read-only files can be removed, as on POSIX.
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl Storage for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(path)?))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        Ok(Box::new(File::create(path)?))
    }

    fn set_readonly(&self, path: &Path) -> io::Result<()> {
        let mut perms = fs::metadata(path)?.permissions();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            perms.set_mode(0o444);
        }
        #[cfg(not(unix))]
        {
            perms.set_readonly(true);
        }
        fs::set_permissions(path, perms)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

#[derive(Clone, Debug, Default)]
struct MemFile {
    bytes: Vec<u8>,
    readonly: bool,
}

type MemTable = BTreeMap<PathBuf, MemFile>;

/// In-memory filesystem. Clones share the same files.
///
/// Permission checks mirror an unprivileged user on a POSIX disk: creating
/// over a read-only file fails, renaming over or removing one does not.
#[derive(Clone, Debug, Default)]
pub struct MemFs {
    files: Arc<Mutex<MemTable>>,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, MemTable> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Place a writable file with `bytes` at `path`, replacing any previous one.
    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.table().insert(path.into(), MemFile { bytes: bytes.into(), readonly: false });
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.table().get(path).map(|f| f.bytes.clone())
    }

    pub fn is_readonly(&self, path: &Path) -> Option<bool> {
        self.table().get(path).map(|f| f.readonly)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.display()))
}

impl Storage for MemFs {
    fn exists(&self, path: &Path) -> bool {
        self.table().contains_key(path)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        let bytes = self.contents(path).ok_or_else(|| not_found(path))?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        let mut table = self.table();
        if table.get(path).map(|f| f.readonly).unwrap_or(false) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is read-only", path.display()),
            ));
        }
        table.insert(path.to_path_buf(), MemFile::default());
        Ok(Box::new(MemWriter { fs: self, path: path.to_path_buf() }))
    }

    fn set_readonly(&self, path: &Path) -> io::Result<()> {
        let mut table = self.table();
        let file = table.get_mut(path).ok_or_else(|| not_found(path))?;
        file.readonly = true;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut table = self.table();
        let file = table.remove(from).ok_or_else(|| not_found(from))?;
        table.insert(to.to_path_buf(), file);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.table().remove(path).map(|_| ()).ok_or_else(|| not_found(path))
    }
}

/// Appends straight into the shared table, so a failed caller leaves its
/// partial content behind the same way a real file would.
struct MemWriter<'a> {
    fs: &'a MemFs,
    path: PathBuf,
}

impl Write for MemWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut table = self.fs.table();
        let file = table.get_mut(&self.path).ok_or_else(|| not_found(&self.path))?;
        file.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
