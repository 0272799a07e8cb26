use std::collections::{HashMap, HashSet};

use matpack_core::MaterialMap;

use crate::renderer::{Renderer, ShaderHandle, UniformLocation, UniformValue};

/// A recording backend that performs no GPU work.
///
/// Every call is logged and remembered so tests can assert exactly what
/// the runtime asked the backend to do. Compilation can be forced to
/// fail and individual uniforms can be hidden to exercise the fallback
/// paths of [`crate::MaterialBinding`].
pub struct NullRenderer {
    next_handle: u64,
    next_location: i32,
    valid: HashSet<u64>,
    locations: HashMap<(u64, String), UniformLocation>,
    missing_uniforms: HashSet<String>,
    known_textures: HashSet<String>,
    fail_next_compile: bool,
    uploads: Vec<(ShaderHandle, UniformLocation, UniformValue)>,
    texture_binds: Vec<(MaterialMap, String)>,
}

/// Handle 0 is reserved for the default shader.
const DEFAULT_SHADER: ShaderHandle = ShaderHandle(0);

impl NullRenderer {
    pub fn new() -> Self {
        let mut valid = HashSet::new();
        valid.insert(DEFAULT_SHADER.0);
        Self {
            next_handle: 1,
            next_location: 0,
            valid,
            locations: HashMap::new(),
            missing_uniforms: HashSet::new(),
            known_textures: HashSet::new(),
            fail_next_compile: false,
            uploads: Vec::new(),
            texture_binds: Vec::new(),
        }
    }

    /// The next `compile_shader` call returns an invalid handle.
    pub fn fail_next_compile(&mut self) {
        self.fail_next_compile = true;
    }

    /// Pretend the shader has no uniform with this name.
    pub fn hide_uniform(&mut self, name: &str) {
        self.missing_uniforms.insert(name.to_string());
    }

    /// Register a texture file so `bind_texture` succeeds for it.
    pub fn register_texture(&mut self, file: &str) {
        self.known_textures.insert(file.to_string());
    }

    pub fn uploads(&self) -> &[(ShaderHandle, UniformLocation, UniformValue)] {
        &self.uploads
    }

    pub fn texture_binds(&self) -> &[(MaterialMap, String)] {
        &self.texture_binds
    }

    /// Looks up the location that was handed out for a uniform, without
    /// creating one. Test helper.
    pub fn location_of(&self, shader: ShaderHandle, name: &str) -> Option<UniformLocation> {
        self.locations.get(&(shader.0, name.to_string())).copied()
    }

    pub fn clear_records(&mut self) {
        self.uploads.clear();
        self.texture_binds.clear();
    }
}

impl Default for NullRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for NullRenderer {
    fn compile_shader(&mut self, vertex: Option<&str>, fragment: Option<&str>) -> ShaderHandle {
        let handle = ShaderHandle(self.next_handle);
        self.next_handle += 1;
        if self.fail_next_compile {
            self.fail_next_compile = false;
            log::trace!("null renderer: compile_shader -> {:?} (failed)", handle);
        } else {
            self.valid.insert(handle.0);
            log::trace!(
                "null renderer: compile_shader(vertex: {}, fragment: {}) -> {:?}",
                vertex.is_some(),
                fragment.is_some(),
                handle
            );
        }
        handle
    }

    fn default_shader(&self) -> ShaderHandle {
        DEFAULT_SHADER
    }

    fn is_shader_valid(&self, shader: ShaderHandle) -> bool {
        self.valid.contains(&shader.0)
    }

    fn uniform_location(&mut self, shader: ShaderHandle, name: &str) -> Option<UniformLocation> {
        if self.missing_uniforms.contains(name) {
            return None;
        }
        let key = (shader.0, name.to_string());
        if let Some(location) = self.locations.get(&key) {
            return Some(*location);
        }
        let location = UniformLocation(self.next_location);
        self.next_location += 1;
        self.locations.insert(key, location);
        log::trace!("null renderer: uniform {:?} in {:?} -> {:?}", name, shader, location);
        Some(location)
    }

    fn upload_uniform(&mut self, shader: ShaderHandle, location: UniformLocation, value: UniformValue) {
        log::trace!("null renderer: upload {:?} at {:?} in {:?}", value, location, shader);
        self.uploads.push((shader, location, value));
    }

    fn bind_texture(&mut self, map: MaterialMap, file: &str) -> bool {
        log::trace!("null renderer: bind texture {:?} to {:?}", file, map);
        self.texture_binds.push((map, file.to_string()));
        self.known_textures.contains(file)
    }
}
