use std::fmt;

use crate::store::StoreMode;

/// Errors that can occur during package container operations.
#[derive(Debug)]
pub enum StoreError {
    /// The requested entry does not exist in the container.
    NotFound(String),
    /// An IO error occurred while accessing the container.
    Io(std::io::Error),
    /// An operation was attempted in the wrong access mode
    /// (read while open for create, or write while open for read).
    AccessMode {
        /// The operation that was attempted.
        operation: &'static str,
        /// The mode the container was opened in.
        mode: StoreMode,
    },
    /// The container contents failed an integrity check
    /// (truncated entry, length mismatch, corrupt compression block).
    Integrity(String),
    /// The container is not a valid archive (bad magic, unsupported version,
    /// malformed entry table).
    Format(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(name) => write!(f, "entry not found: {name}"),
            StoreError::Io(err) => write!(f, "IO error: {err}"),
            StoreError::AccessMode { operation, mode } => {
                write!(f, "{operation} is not permitted in {mode:?} mode")
            }
            StoreError::Integrity(msg) => write!(f, "integrity error: {msg}"),
            StoreError::Format(msg) => write!(f, "format error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            StoreError::NotFound(err.to_string())
        } else {
            StoreError::Io(err)
        }
    }
}
