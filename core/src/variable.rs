//! Typed shader-uniform variables.
//!
//! Every `uniform` declaration in a material's shader source maps to one
//! [`Variable`]: a closed sum of value types ([`VariableValue`]) plus the
//! flags the editor and runtime need. The set of types is fixed; dispatch is
//! exhaustive pattern matching at the serialization and upload boundaries,
//! never a type registry consulted at runtime.

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Texture slot of a material, in standard map order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialMap {
    Albedo,
    Metalness,
    Normal,
    Roughness,
    Occlusion,
    Emission,
    Height,
    Cubemap,
    Irradiance,
    Prefilter,
    Brdf,
}

impl MaterialMap {
    /// The texture unit index this map binds to.
    pub fn slot(self) -> u32 {
        self as u32
    }
}

/// A texture binding: the package file it resolves to, and optionally which
/// material map the sampler feeds. `None` means the runtime's default
/// (albedo) slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSlot {
    /// Name of an image file entry inside the package.
    pub file: String,
    /// Material map this sampler feeds, if pinned by the user.
    pub map: Option<MaterialMap>,
}

impl TextureSlot {
    /// An unbound texture slot (no file selected yet).
    pub fn unbound() -> Self {
        Self {
            file: String::new(),
            map: None,
        }
    }

    /// Whether the slot points at a file.
    pub fn is_bound(&self) -> bool {
        !self.file.is_empty()
    }
}

/// The value of one shader variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariableValue {
    Int(i32),
    Float(f32),
    Vector2(Vec2),
    Vector3(Vec3),
    Vector4(Vec4),
    Matrix4(Mat4),
    Color(Color),
    Texture(TextureSlot),
    /// Index into the scene's light list (see the render crate's light
    /// manager).
    Light(u32),
    /// A uniform whose GLSL type has no mapping. Kept so the rest of the
    /// variable set stays consistent; never uploaded.
    Unsupported,
}

impl VariableValue {
    /// The type tag of this value.
    pub fn kind(&self) -> VariableKind {
        match self {
            VariableValue::Int(_) => VariableKind::Int,
            VariableValue::Float(_) => VariableKind::Float,
            VariableValue::Vector2(_) => VariableKind::Vector2,
            VariableValue::Vector3(_) => VariableKind::Vector3,
            VariableValue::Vector4(_) => VariableKind::Vector4,
            VariableValue::Matrix4(_) => VariableKind::Matrix4,
            VariableValue::Color(_) => VariableKind::Color,
            VariableValue::Texture(_) => VariableKind::Texture,
            VariableValue::Light(_) => VariableKind::Light,
            VariableValue::Unsupported => VariableKind::Unsupported,
        }
    }
}

/// Type tag for [`VariableValue`].
///
/// This is also the serialization allow-list: the `type_name` /
/// `from_type_name` table below is the closed set of type names a persisted
/// document may carry. Deserialization resolves names through this table
/// before decoding any payload, so a crafted document cannot name a type
/// outside the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Int,
    Float,
    Vector2,
    Vector3,
    Vector4,
    Matrix4,
    Color,
    Texture,
    Light,
    Unsupported,
}

/// The closed table of serializable variable types.
const VARIABLE_TYPE_TABLE: &[(&str, VariableKind)] = &[
    ("Int", VariableKind::Int),
    ("Float", VariableKind::Float),
    ("Vector2", VariableKind::Vector2),
    ("Vector3", VariableKind::Vector3),
    ("Vector4", VariableKind::Vector4),
    ("Matrix4", VariableKind::Matrix4),
    ("Color", VariableKind::Color),
    ("Texture", VariableKind::Texture),
    ("Light", VariableKind::Light),
    ("Unsupported", VariableKind::Unsupported),
];

impl VariableKind {
    /// Serialized name of this type.
    pub fn type_name(self) -> &'static str {
        VARIABLE_TYPE_TABLE
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("Unsupported")
    }

    /// Resolve a serialized type name against the allow-list.
    pub fn from_type_name(name: &str) -> Option<Self> {
        VARIABLE_TYPE_TABLE
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, kind)| *kind)
    }

    /// All serializable type names, in table order.
    pub fn allowed_type_names() -> impl Iterator<Item = &'static str> {
        VARIABLE_TYPE_TABLE.iter().map(|(name, _)| *name)
    }

    /// Default value a freshly created variable of this type carries.
    ///
    /// Colors default to [`Color::MAGENTA`] so an unset binding is loud on
    /// screen instead of silently black or white.
    pub fn default_value(self) -> VariableValue {
        match self {
            VariableKind::Int => VariableValue::Int(0),
            VariableKind::Float => VariableValue::Float(0.0),
            VariableKind::Vector2 => VariableValue::Vector2(Vec2::ZERO),
            VariableKind::Vector3 => VariableValue::Vector3(Vec3::ZERO),
            VariableKind::Vector4 => VariableValue::Vector4(Vec4::ZERO),
            VariableKind::Matrix4 => VariableValue::Matrix4(Mat4::IDENTITY),
            VariableKind::Color => VariableValue::Color(Color::MAGENTA),
            VariableKind::Texture => VariableValue::Texture(TextureSlot::unbound()),
            VariableKind::Light => VariableValue::Light(0),
            VariableKind::Unsupported => VariableValue::Unsupported,
        }
    }
}

/// Uniform names whose values are supplied by the engine every frame
/// (transforms, camera position) rather than edited by the user.
const ENGINE_MANAGED_UNIFORMS: &[&str] = &[
    "mvp",
    "matModel",
    "matView",
    "matProjection",
    "matNormal",
    "viewPos",
];

/// Whether a uniform is engine-managed by naming convention or by type.
/// Light uniforms are always engine-managed: their values come from the
/// scene's light list, not from the variable editor.
pub fn is_engine_managed(name: &str, kind: VariableKind) -> bool {
    kind == VariableKind::Light || ENGINE_MANAGED_UNIFORMS.contains(&name)
}

/// One named shader binding: a typed value plus editor/runtime flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// The typed value.
    pub value: VariableValue,
    /// Engine-managed: the value is computed per frame, not user-edited.
    pub internal: bool,
    /// Dirty flag: the runtime uploads this variable and clears the flag.
    /// Transient — never persisted; set after load so every variable uploads
    /// on the first frame.
    pub send_to_shader: bool,
}

impl Variable {
    /// Create a variable with an explicit value. Starts dirty.
    pub fn new(value: VariableValue, internal: bool) -> Self {
        Self {
            value,
            internal,
            send_to_shader: true,
        }
    }

    /// Create a default-initialized variable of the given type. Starts dirty.
    pub fn of_kind(kind: VariableKind, internal: bool) -> Self {
        Self::new(kind.default_value(), internal)
    }

    /// The type tag of the current value.
    pub fn kind(&self) -> VariableKind {
        self.value.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_name_round_trip() {
        for name in VariableKind::allowed_type_names() {
            let kind = VariableKind::from_type_name(name).unwrap();
            assert_eq!(kind.type_name(), name);
        }
    }

    #[test]
    fn unknown_type_name_rejected() {
        assert_eq!(VariableKind::from_type_name("System.Diagnostics.Process"), None);
        assert_eq!(VariableKind::from_type_name("vector4"), None);
        assert_eq!(VariableKind::from_type_name(""), None);
    }

    #[test]
    fn default_color_is_magenta() {
        assert_eq!(
            VariableKind::Color.default_value(),
            VariableValue::Color(Color::MAGENTA)
        );
    }

    #[test]
    fn default_values_match_kinds() {
        for name in VariableKind::allowed_type_names() {
            let kind = VariableKind::from_type_name(name).unwrap();
            assert_eq!(kind.default_value().kind(), kind);
        }
    }

    #[test]
    fn engine_managed_detection() {
        assert!(is_engine_managed("matModel", VariableKind::Matrix4));
        assert!(is_engine_managed("viewPos", VariableKind::Vector3));
        assert!(is_engine_managed("sun", VariableKind::Light));
        assert!(!is_engine_managed("roughness", VariableKind::Float));
    }

    #[test]
    fn new_variable_starts_dirty() {
        let var = Variable::of_kind(VariableKind::Float, false);
        assert!(var.send_to_shader);
        assert_eq!(var.value, VariableValue::Float(0.0));
    }
}
