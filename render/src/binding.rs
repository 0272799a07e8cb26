use std::collections::HashMap;

use matpack_core::{
    MaterialMap, MaterialPackage, PackageError, ShaderStage, VariableValue,
};

use crate::lights::LightManager;
use crate::renderer::{Renderer, ShaderHandle, UniformLocation, UniformValue};

/// A material package compiled against a backend.
///
/// Holds the shader handle and a cache of resolved uniform locations so
/// per-frame uploads never touch the backend's name lookup twice for
/// the same uniform.
pub struct MaterialBinding {
    shader: ShaderHandle,
    valid: bool,
    locations: HashMap<String, Option<UniformLocation>>,
}

impl MaterialBinding {
    /// Compiles the package's active shaders. When compilation fails the
    /// binding falls back to the backend's default shader and reports
    /// itself as invalid, so callers can keep drawing while the material
    /// is broken.
    pub fn compile(
        package: &MaterialPackage,
        renderer: &mut dyn Renderer,
    ) -> Result<Self, PackageError> {
        let vertex = package.shader_source(ShaderStage::Vertex)?;
        let fragment = package.shader_source(ShaderStage::Fragment)?;
        let handle = renderer.compile_shader(vertex.as_deref(), fragment.as_deref());
        let (shader, valid) = if renderer.is_shader_valid(handle) {
            (handle, true)
        } else {
            log::error!("shader compilation failed, falling back to default shader");
            (renderer.default_shader(), false)
        };
        Ok(Self {
            shader,
            valid,
            locations: HashMap::new(),
        })
    }

    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }

    /// False when the binding is running on the fallback shader.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Uploads every pending variable and returns how many uniform
    /// values were sent. With `force` set, all variables are sent
    /// regardless of their pending flag.
    ///
    /// A variable's pending flag is cleared even when its uniform is
    /// absent from the compiled shader, otherwise an optimized-out
    /// uniform would be retried every frame.
    pub fn upload(
        &mut self,
        package: &mut MaterialPackage,
        lights: &LightManager,
        renderer: &mut dyn Renderer,
        force: bool,
    ) -> u32 {
        let shader = self.shader;
        let mut sent = 0;
        for (name, variable) in package.variables_mut() {
            if !variable.send_to_shader && !force {
                continue;
            }
            match &variable.value {
                VariableValue::Int(v) => {
                    sent += upload_plain(&mut self.locations, renderer, shader, name, UniformValue::Int(*v));
                }
                VariableValue::Float(v) => {
                    sent += upload_plain(&mut self.locations, renderer, shader, name, UniformValue::Float(*v));
                }
                VariableValue::Vector2(v) => {
                    sent += upload_plain(&mut self.locations, renderer, shader, name, UniformValue::Vector2(*v));
                }
                VariableValue::Vector3(v) => {
                    sent += upload_plain(&mut self.locations, renderer, shader, name, UniformValue::Vector3(*v));
                }
                VariableValue::Vector4(v) => {
                    sent += upload_plain(&mut self.locations, renderer, shader, name, UniformValue::Vector4(*v));
                }
                VariableValue::Matrix4(v) => {
                    sent += upload_plain(&mut self.locations, renderer, shader, name, UniformValue::Matrix4(*v));
                }
                VariableValue::Color(c) => {
                    sent += upload_plain(&mut self.locations, renderer, shader, name, UniformValue::Vector4(c.to_vec4()));
                }
                VariableValue::Texture(slot) => {
                    if slot.is_bound() {
                        let map = slot.map.unwrap_or(MaterialMap::Albedo);
                        if renderer.bind_texture(map, &slot.file) {
                            sent += 1;
                        } else {
                            log::warn!("texture {:?} for uniform {:?} is not loaded", slot.file, name);
                        }
                    }
                }
                VariableValue::Light(index) => {
                    if let Some(light) = lights.get(*index) {
                        sent += upload_light(&mut self.locations, renderer, shader, name, light);
                    } else {
                        log::warn!("uniform {:?} references missing light {}", name, index);
                    }
                }
                VariableValue::Unsupported => {}
            }
            variable.send_to_shader = false;
        }
        sent
    }
}

fn resolve(
    cache: &mut HashMap<String, Option<UniformLocation>>,
    renderer: &mut dyn Renderer,
    shader: ShaderHandle,
    name: &str,
) -> Option<UniformLocation> {
    if let Some(cached) = cache.get(name) {
        return *cached;
    }
    let location = renderer.uniform_location(shader, name);
    cache.insert(name.to_string(), location);
    location
}

fn upload_plain(
    cache: &mut HashMap<String, Option<UniformLocation>>,
    renderer: &mut dyn Renderer,
    shader: ShaderHandle,
    name: &str,
    value: UniformValue,
) -> u32 {
    match resolve(cache, renderer, shader, name) {
        Some(location) => {
            renderer.upload_uniform(shader, location, value);
            1
        }
        None => 0,
    }
}

/// Lights are structs on the shader side, uploaded one member at a time.
fn upload_light(
    cache: &mut HashMap<String, Option<UniformLocation>>,
    renderer: &mut dyn Renderer,
    shader: ShaderHandle,
    name: &str,
    light: &crate::lights::Light,
) -> u32 {
    let members: [(&str, UniformValue); 5] = [
        ("enabled", UniformValue::Int(light.enabled as i32)),
        ("type", UniformValue::Int(light.kind.shader_index())),
        ("position", UniformValue::Vector3(light.position)),
        ("target", UniformValue::Vector3(light.target)),
        ("color", UniformValue::Vector4(light.color.to_vec4())),
    ];
    let mut sent = 0;
    for (member, value) in members {
        let qualified = format!("{}.{}", name, member);
        sent += upload_plain(cache, renderer, shader, &qualified, value);
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::Light;
    use crate::null::NullRenderer;
    use glam::Vec3;
    use matpack_core::Color;

    const FRAG: &[u8] = b"#version 330\nuniform vec4 colDiffuse;\nvoid main() {}\n";

    fn package_with_fragment(source: &[u8]) -> MaterialPackage {
        let mut package = MaterialPackage::new();
        let id = package.add_file("shader.frag", source.to_vec()).unwrap();
        package.activate_shader(&id).unwrap();
        package.refresh_variables().unwrap();
        package
    }

    #[test]
    fn compile_uses_active_shaders() {
        let mut renderer = NullRenderer::new();
        let package = package_with_fragment(FRAG);
        let binding = MaterialBinding::compile(&package, &mut renderer).unwrap();
        assert!(binding.is_valid());
        assert_ne!(binding.shader(), renderer.default_shader());
    }

    #[test]
    fn compile_failure_falls_back_to_default() {
        let mut renderer = NullRenderer::new();
        let package = package_with_fragment(FRAG);
        renderer.fail_next_compile();
        let binding = MaterialBinding::compile(&package, &mut renderer).unwrap();
        assert!(!binding.is_valid());
        assert_eq!(binding.shader(), renderer.default_shader());
    }

    #[test]
    fn upload_sends_pending_values_once() {
        let mut renderer = NullRenderer::new();
        let mut package = package_with_fragment(FRAG);
        let mut binding = MaterialBinding::compile(&package, &mut renderer).unwrap();
        let lights = LightManager::new();

        let sent = binding.upload(&mut package, &lights, &mut renderer, false);
        assert_eq!(sent, 1);
        let location = renderer.location_of(binding.shader(), "colDiffuse").unwrap();
        assert_eq!(
            renderer.uploads(),
            &[(binding.shader(), location, UniformValue::Vector4(Color::MAGENTA.to_vec4()))]
        );

        renderer.clear_records();
        let sent = binding.upload(&mut package, &lights, &mut renderer, false);
        assert_eq!(sent, 0);
        assert!(renderer.uploads().is_empty());
    }

    #[test]
    fn force_resends_clean_values() {
        let mut renderer = NullRenderer::new();
        let mut package = package_with_fragment(FRAG);
        let mut binding = MaterialBinding::compile(&package, &mut renderer).unwrap();
        let lights = LightManager::new();

        binding.upload(&mut package, &lights, &mut renderer, false);
        renderer.clear_records();
        let sent = binding.upload(&mut package, &lights, &mut renderer, true);
        assert_eq!(sent, 1);
    }

    #[test]
    fn missing_uniform_still_clears_pending_flag() {
        let mut renderer = NullRenderer::new();
        renderer.hide_uniform("colDiffuse");
        let mut package = package_with_fragment(FRAG);
        let mut binding = MaterialBinding::compile(&package, &mut renderer).unwrap();
        let lights = LightManager::new();

        let sent = binding.upload(&mut package, &lights, &mut renderer, false);
        assert_eq!(sent, 0);
        assert!(!package.variable("colDiffuse").unwrap().send_to_shader);
    }

    #[test]
    fn bound_texture_is_sent_to_its_map_slot() {
        let mut renderer = NullRenderer::new();
        renderer.register_texture("albedo.png");
        let mut package =
            package_with_fragment(b"#version 330\nuniform sampler2D texture0;\nvoid main() {}\n");
        package.add_file("albedo.png", vec![1, 2, 3]).unwrap();
        let mut slot = matpack_core::TextureSlot::unbound();
        slot.file = "albedo.png".to_string();
        package
            .set_variable_value("texture0", VariableValue::Texture(slot))
            .unwrap();

        let mut binding = MaterialBinding::compile(&package, &mut renderer).unwrap();
        let lights = LightManager::new();
        let sent = binding.upload(&mut package, &lights, &mut renderer, false);
        assert_eq!(sent, 1);
        assert_eq!(
            renderer.texture_binds(),
            &[(MaterialMap::Albedo, "albedo.png".to_string())]
        );
    }

    #[test]
    fn unbound_texture_is_skipped() {
        let mut renderer = NullRenderer::new();
        let mut package =
            package_with_fragment(b"#version 330\nuniform sampler2D texture0;\nvoid main() {}\n");

        let mut binding = MaterialBinding::compile(&package, &mut renderer).unwrap();
        let lights = LightManager::new();
        let sent = binding.upload(&mut package, &lights, &mut renderer, false);
        assert_eq!(sent, 0);
        assert!(renderer.texture_binds().is_empty());
        assert!(!package.variable("texture0").unwrap().send_to_shader);
    }

    #[test]
    fn light_uploads_every_member() {
        let mut renderer = NullRenderer::new();
        let mut package =
            package_with_fragment(b"#version 330\nuniform Light lights0;\nvoid main() {}\n");

        let mut lights = LightManager::new();
        let index = lights
            .add(Light::point(Vec3::new(1.0, 2.0, 3.0), Color::WHITE))
            .unwrap();
        package
            .set_variable_value("lights0", VariableValue::Light(index))
            .unwrap();

        let mut binding = MaterialBinding::compile(&package, &mut renderer).unwrap();
        let sent = binding.upload(&mut package, &lights, &mut renderer, false);
        assert_eq!(sent, 5);
        let shader = binding.shader();
        let enabled = renderer.location_of(shader, "lights0.enabled").unwrap();
        assert!(renderer
            .uploads()
            .contains(&(shader, enabled, UniformValue::Int(1))));
        let position = renderer.location_of(shader, "lights0.position").unwrap();
        assert!(renderer
            .uploads()
            .contains(&(shader, position, UniformValue::Vector3(Vec3::new(1.0, 2.0, 3.0)))));
    }

    #[test]
    fn unsupported_values_are_skipped() {
        let mut renderer = NullRenderer::new();
        let mut package =
            package_with_fragment(b"#version 330\nuniform mat3 odd;\nvoid main() {}\n");
        assert!(matches!(
            package.variable("odd").unwrap().value,
            VariableValue::Unsupported
        ));
        let mut binding = MaterialBinding::compile(&package, &mut renderer).unwrap();
        let lights = LightManager::new();
        let sent = binding.upload(&mut package, &lights, &mut renderer, false);
        assert_eq!(sent, 0);
        assert!(renderer.uploads().is_empty());
    }
}
