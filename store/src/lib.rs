//! Package container backends for matpack material packages.
//!
//! A *container* holds a metadata document plus named binary/text entries in
//! a flat namespace. This crate provides the [`EntryStore`] trait and two
//! backends:
//!
//! - [`DirectoryStore`] — one entry per file in a directory, for inspecting
//!   unpacked materials and for tests.
//! - [`ArchiveStore`] — a single LZ4-compressed archive file, the persisted
//!   `.mat` package format used by `matpack-core`.
//!
//! # Access modes
//!
//! Containers are opened in either [`StoreMode::Read`] or
//! [`StoreMode::Create`]; a container is read out in full or assembled and
//! written in full, never edited in place. Using an operation in the wrong
//! mode is a programming error and fails with [`StoreError::AccessMode`]
//! rather than panicking.
//!
//! # Backups
//!
//! Creating an archive over an existing file copies the previous file to
//! `<path>.bck` first. The backup is best-effort, not transactional; see
//! [`ArchiveStore`] for the exact guarantees.

mod archive;
mod directory;
mod error;
mod store;

pub use archive::ArchiveStore;
pub use directory::DirectoryStore;
pub use error::StoreError;
pub use store::{EntryStore, StoreMode};
