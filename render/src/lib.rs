//! Runtime side of matpack: compiling a [`matpack_core::MaterialPackage`]'s
//! shaders against a backend and streaming its variables into uniforms.
//!
//! The [`Renderer`] trait is the only surface a GPU backend has to
//! implement. [`NullRenderer`] is a recording implementation used by the
//! crate's own tests and by tooling that wants the full package pipeline
//! without a GPU.

pub mod binding;
pub mod defaults;
pub mod lights;
pub mod null;
pub mod renderer;

pub use binding::MaterialBinding;
pub use defaults::{DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER};
pub use lights::{Light, LightKind, LightManager, MAX_LIGHTS};
pub use null::NullRenderer;
pub use renderer::{Renderer, ShaderHandle, UniformLocation, UniformValue};
