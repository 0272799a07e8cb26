use crate::error::StoreError;

/// Access mode a container was opened in.
///
/// Containers are either read out in full or written out in full; there is no
/// mixed-mode editing of an existing container. Attempting an operation in
/// the wrong mode is a programming error and fails with
/// [`StoreError::AccessMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// The container exists and entries may be read from it.
    Read,
    /// A new container is being assembled and entries may be written to it.
    Create,
}

/// A container holding named binary/text entries in a flat namespace.
///
/// Two backends implement this trait:
///
/// - [`DirectoryStore`](crate::DirectoryStore) — one entry per file in a
///   single directory, mainly for inspection and tests.
/// - [`ArchiveStore`](crate::ArchiveStore) — a single compressed archive
///   file, the persisted `.mat` package format.
///
/// Entry names are plain file names; no directory structure is modeled
/// inside a container.
pub trait EntryStore {
    /// The mode this container was opened in.
    fn mode(&self) -> StoreMode;

    /// Read the raw bytes of an entry. Read mode only.
    fn read_entry(&mut self, name: &str) -> Result<Vec<u8>, StoreError>;

    /// Write an entry. Create mode only. Writing the same name twice
    /// replaces the previous entry.
    fn write_entry(&mut self, name: &str, data: &[u8]) -> Result<(), StoreError>;

    /// Names of all entries currently in the container, sorted.
    fn entry_names(&self) -> Vec<String>;

    /// Whether an entry with the given name exists.
    fn contains(&self, name: &str) -> bool;

    /// Whether the container's backing storage exists on disk. False for a
    /// container being assembled that has not been flushed yet.
    fn exists(&self) -> bool;

    /// Flush the container to its backing storage. Meaningful in Create
    /// mode; a no-op for Read mode.
    fn finish(&mut self) -> Result<(), StoreError>;

    /// Read an entry and decode it as UTF-8 text. Read mode only.
    fn read_text_entry(&mut self, name: &str) -> Result<String, StoreError> {
        let bytes = self.read_entry(name)?;
        String::from_utf8(bytes)
            .map_err(|_| StoreError::Format(format!("entry '{name}' is not valid UTF-8")))
    }

    /// Write a text entry. Create mode only.
    fn write_text_entry(&mut self, name: &str, text: &str) -> Result<(), StoreError> {
        self.write_entry(name, text.as_bytes())
    }
}

/// Fail with [`StoreError::AccessMode`] unless the container is in the
/// expected mode.
pub(crate) fn require_mode(
    actual: StoreMode,
    expected: StoreMode,
    operation: &'static str,
) -> Result<(), StoreError> {
    if actual == expected {
        Ok(())
    } else {
        Err(StoreError::AccessMode {
            operation,
            mode: actual,
        })
    }
}
