//! Material package model for the matpack toolchain.
//!
//! A *material package* is a self-contained archive bundling a shader pair
//! (vertex + fragment), auxiliary image assets, and a typed set of
//! shader-uniform bindings. This crate is the CPU side of that story:
//!
//! - [`VariableValue`] / [`Variable`] — the closed set of typed values a
//!   GLSL uniform can map to, with editor/runtime flags.
//! - [`parser`] — the uniform-declaration scanner that turns shader source
//!   into an ordered name → type mapping.
//! - [`MaterialMeta`] — the persisted metadata document, with an explicit
//!   type allow-list guarding deserialization.
//! - [`MaterialPackage`] — the engine: file table, reference counting, the
//!   variable synchronization algorithm, and archive save/load through
//!   `matpack-store`.
//!
//! GPU upload of the variable dictionary lives in `matpack-render`.
//!
//! # Synchronization
//!
//! Whenever shader code changes, [`MaterialPackage::refresh_variables`]
//! re-parses the active sources and reconciles the variable dictionary:
//! new uniforms gain defaulted variables, retyped uniforms get fresh
//! variables of the new type, removed uniforms are pruned, and everything
//! else keeps its value byte for byte. A malformed shader never destroys
//! the working variable set.

pub mod color;
pub mod config;
pub mod error;
pub mod file;
pub mod meta;
pub mod package;
pub mod parser;
pub mod variable;

pub use color::Color;
pub use config::ToolConfig;
pub use error::PackageError;
pub use file::{FileId, FileKind};
pub use meta::{MaterialMeta, SchemaError, ShaderStage, CURRENT_META_VERSION, META_ENTRY_NAME};
pub use package::{MaterialPackage, SyncReport};
pub use parser::{parse_uniforms, ParseError, ParsedUniforms};
pub use variable::{
    is_engine_managed, MaterialMap, TextureSlot, Variable, VariableKind, VariableValue,
};
