use glam::{Mat4, Vec2, Vec3, Vec4};
use matpack_core::MaterialMap;

/// Opaque identifier for a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u64);

/// Opaque identifier for a uniform slot inside a compiled shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

/// A value in the form a shader backend accepts it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vector2(Vec2),
    Vector3(Vec3),
    Vector4(Vec4),
    Matrix4(Mat4),
}

/// The surface a rendering backend exposes to the material runtime.
///
/// Implementations own shader compilation and resource binding. The
/// runtime only ever talks through handles and locations, so backends
/// are free to keep whatever bookkeeping their API needs.
pub trait Renderer {
    /// Compiles a shader program from the given stage sources. A stage
    /// passed as `None` falls back to the backend's built-in source for
    /// that stage. Always returns a handle; check [`Renderer::is_shader_valid`]
    /// to learn whether compilation actually succeeded.
    fn compile_shader(&mut self, vertex: Option<&str>, fragment: Option<&str>) -> ShaderHandle;

    /// The backend's always-valid fallback shader.
    fn default_shader(&self) -> ShaderHandle;

    fn is_shader_valid(&self, shader: ShaderHandle) -> bool;

    /// Resolves a uniform by name. `None` means the shader has no such
    /// uniform (or the compiler optimized it out).
    fn uniform_location(&mut self, shader: ShaderHandle, name: &str) -> Option<UniformLocation>;

    fn upload_uniform(&mut self, shader: ShaderHandle, location: UniformLocation, value: UniformValue);

    /// Binds the texture stored under `file` to the given material map
    /// slot. Returns false when the backend has no texture for `file`.
    fn bind_texture(&mut self, map: MaterialMap, file: &str) -> bool;
}
