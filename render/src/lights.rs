use glam::Vec3;
use matpack_core::Color;

/// Shader-side light arrays are sized for this many entries.
pub const MAX_LIGHTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Directional,
    Point,
}

impl LightKind {
    /// The integer the shader switches on.
    pub fn shader_index(self) -> i32 {
        match self {
            LightKind::Directional => 0,
            LightKind::Point => 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub enabled: bool,
    pub kind: LightKind,
    pub position: Vec3,
    pub target: Vec3,
    pub color: Color,
}

impl Light {
    pub fn directional(position: Vec3, target: Vec3, color: Color) -> Self {
        Self {
            enabled: true,
            kind: LightKind::Directional,
            position,
            target,
            color,
        }
    }

    pub fn point(position: Vec3, color: Color) -> Self {
        Self {
            enabled: true,
            kind: LightKind::Point,
            position,
            target: Vec3::ZERO,
            color,
        }
    }
}

/// Owns the scene lights a material's `Light` variables index into.
#[derive(Default)]
pub struct LightManager {
    lights: Vec<Light>,
}

impl LightManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a light and returns its index, or `None` when the array the
    /// shaders were compiled against is already full.
    pub fn add(&mut self, light: Light) -> Option<u32> {
        if self.lights.len() >= MAX_LIGHTS {
            log::warn!("light limit of {} reached, light dropped", MAX_LIGHTS);
            return None;
        }
        self.lights.push(light);
        Some(self.lights.len() as u32 - 1)
    }

    pub fn get(&self, index: u32) -> Option<&Light> {
        self.lights.get(index as usize)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut Light> {
        self.lights.get_mut(index as usize)
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }
}
