//! Persistence collaborator for the vault file.
//!
//! The lifecycle manager only ever reads or writes the vault as one
//! whole byte array.  `FileStorage` is the real backend; `MemoryStorage`
//! keeps the bytes in memory for embedding hosts and tests.

use std::cell::{Cell, RefCell};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::Result;

/// Whole-file byte storage for a single vault.
pub trait VaultStorage {
    /// Returns `true` if a vault has been written.
    fn exists(&self) -> Result<bool>;

    /// Read the full vault, or `None` if no vault exists.
    fn read(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the full vault with `bytes`.
    fn write(&self, bytes: &[u8]) -> Result<()>;

    /// Human-readable location, used in messages.
    fn describe(&self) -> String;
}

/// A vault stored in a single file on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VaultStorage for FileStorage {
    fn exists(&self) -> Result<bool> {
        Ok(self.path.is_file())
    }

    fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the vault **atomically**.
    ///
    /// The bytes go to a temp file in the same directory, are flushed to
    /// disk, and the temp file is then renamed over the target.  If the
    /// rename fails the temp file is removed and the old vault is kept.
    fn write(&self, bytes: &[u8]) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = parent.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ));

        let mut file = fs::File::create(&tmp_path)?;

        // On Unix, restrict permissions to owner-only read/write.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A vault held in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    bytes: RefCell<Option<Vec<u8>>>,
    writes: Cell<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing vault bytes.
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: RefCell::new(Some(bytes)),
            writes: Cell::new(0),
        }
    }

    /// A copy of the currently stored bytes.
    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.bytes.borrow().clone()
    }

    /// Number of successful `write` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl VaultStorage for MemoryStorage {
    fn exists(&self) -> Result<bool> {
        Ok(self.bytes.borrow().is_some())
    }

    fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.snapshot())
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        *self.bytes.borrow_mut() = Some(bytes.to_vec());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}
