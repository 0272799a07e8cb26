use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::store::{require_mode, EntryStore, StoreMode};

/// Directory-backed container: one entry per regular file in a single
/// directory.
///
/// Subdirectories are ignored — the container namespace is flat. This backend
/// is used to scan unpacked material directories and in tests; the persisted
/// package format is [`ArchiveStore`](crate::ArchiveStore).
///
/// # Example
///
/// ```ignore
/// let mut store = DirectoryStore::open("./materials/rust")?;
/// for name in store.entry_names() {
///     let bytes = store.read_entry(&name)?;
/// }
/// ```
pub struct DirectoryStore {
    root: PathBuf,
    mode: StoreMode,
}

impl DirectoryStore {
    /// Open an existing directory for reading.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::NotFound(root.display().to_string()));
        }
        Ok(Self {
            root,
            mode: StoreMode::Read,
        })
    }

    /// Create a directory container for writing. The directory is created if
    /// it does not exist yet.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            mode: StoreMode::Create,
        })
    }

    /// The directory backing this container.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl EntryStore for DirectoryStore {
    fn mode(&self) -> StoreMode {
        self.mode
    }

    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, StoreError> {
        require_mode(self.mode, StoreMode::Read, "read_entry")?;
        let path = self.resolve(name);
        if !path.is_file() {
            return Err(StoreError::NotFound(name.to_owned()));
        }
        Ok(std::fs::read(path)?)
    }

    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        require_mode(self.mode, StoreMode::Create, "write_entry")?;
        std::fs::write(self.resolve(name), data)?;
        Ok(())
    }

    fn entry_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return names;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_owned());
                }
            }
        }
        names.sort();
        names
    }

    fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_file()
    }

    fn exists(&self) -> bool {
        self.root.is_dir()
    }

    fn finish(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
