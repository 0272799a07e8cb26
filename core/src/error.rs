//! Package engine error type.

use thiserror::Error;

use crate::meta::SchemaError;
use crate::parser::ParseError;
use matpack_store::StoreError;

/// Errors raised by [`MaterialPackage`](crate::MaterialPackage) operations.
///
/// The first four variants are invariant violations rejected synchronously
/// at the call site; the caller may retry or ignore them. The wrapped
/// variants are load/save/parse failures that abort the whole operation.
#[derive(Debug, Error)]
pub enum PackageError {
    /// `add_file` with a FileId that is already present. Adding never
    /// overwrites; use `update_file` to replace content.
    #[error("file '{0}' already exists in the package")]
    FileExists(String),

    /// `add_file` with the entry name the metadata document is stored
    /// under; the name belongs to the container format, not to assets.
    #[error("file name '{0}' is reserved for the package metadata")]
    ReservedName(String),

    /// The named file is not in the package.
    #[error("file '{0}' does not exist in the package")]
    FileNotFound(String),

    /// `delete_file` on a file still referenced by an active shader binding
    /// or a texture variable.
    #[error("file '{name}' is still referenced {count} time(s)")]
    FileReferenced { name: String, count: u32 },

    /// `activate_shader` on a file that is not a shader stage.
    #[error("file '{0}' is not a vertex or fragment shader")]
    NotAShader(String),

    /// A variable was assigned a value of a different type than it holds.
    #[error("variable '{name}' holds {current}, not {proposed}")]
    VariableTypeMismatch {
        name: String,
        current: &'static str,
        proposed: &'static str,
    },

    /// The named variable is not in the dictionary.
    #[error("variable '{0}' does not exist")]
    VariableNotFound(String),

    /// An active shader file is not valid UTF-8 text.
    #[error("shader '{0}' is not valid UTF-8")]
    ShaderNotText(String),

    /// Shader source failed to parse; the variable set was left untouched.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The metadata document failed to encode or decode.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The package container failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
