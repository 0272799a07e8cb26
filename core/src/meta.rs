//! The persisted metadata document.
//!
//! [`MaterialMeta`] is the `material.meta` entry of a package: description,
//! author, tags, the shader file bound to each stage, and the variable
//! dictionary. It round-trips through RON text.
//!
//! # Type allow-list
//!
//! A package file is a trust boundary: a crafted document must not be able to
//! name arbitrary types. Variables are encoded as `(type, internal, value)`
//! and the `type` name is resolved against the closed table in
//! [`VariableKind`] *before* any payload is decoded. An unknown name fails
//! the whole load with [`SchemaError::TypeDenied`]; nothing outside the
//! table can ever be instantiated. The format requires `type` to precede
//! `value` so the payload decoder always knows its target type.

use std::collections::BTreeMap;
use std::fmt;

use glam::Mat4;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::color::Color;
use crate::file::FileKind;
use crate::variable::{TextureSlot, Variable, VariableKind, VariableValue};

/// Document version written by this crate.
pub const CURRENT_META_VERSION: u32 = 1;

/// Name of the metadata entry inside a package container.
pub const META_ENTRY_NAME: &str = "material.meta";

/// Errors raised while encoding or decoding a metadata document.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The document names a variable type outside the allow-list.
    #[error("variable type '{0}' is not on the serialization allow-list")]
    TypeDenied(String),
    /// The document was written by a newer version of the format.
    #[error("unsupported document version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    /// The document text is not a valid metadata document.
    #[error("malformed metadata document: {0}")]
    Malformed(String),
}

/// Shader stage a package binds a file to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// The stage a file kind feeds, if it is a shader at all.
    pub fn for_file_kind(kind: FileKind) -> Option<Self> {
        match kind {
            FileKind::VertexShader => Some(ShaderStage::Vertex),
            FileKind::FragmentShader => Some(ShaderStage::Fragment),
            FileKind::Image | FileKind::Unknown => None,
        }
    }

    /// The file kind a shader of this stage has.
    pub fn file_kind(self) -> FileKind {
        match self {
            ShaderStage::Vertex => FileKind::VertexShader,
            ShaderStage::Fragment => FileKind::FragmentShader,
        }
    }
}

/// The serialized material schema: everything a package persists besides the
/// raw file entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialMeta {
    /// Format version, for forward compatibility. No migrations exist yet;
    /// loads only check the version is not from the future.
    pub version: u32,
    pub description: String,
    pub author: String,
    pub tags: Vec<String>,
    /// Active shader file name per stage. Each name should reference a file
    /// entry of the matching kind; this is re-validated when references are
    /// rebuilt, not rejected at load.
    pub shaders: BTreeMap<ShaderStage, String>,
    /// The variable dictionary, keyed by uniform name.
    pub variables: BTreeMap<String, Variable>,
}

impl Default for MaterialMeta {
    fn default() -> Self {
        Self {
            version: CURRENT_META_VERSION,
            description: String::new(),
            author: String::new(),
            tags: Vec::new(),
            shaders: BTreeMap::new(),
            variables: BTreeMap::new(),
        }
    }
}

impl MaterialMeta {
    /// Serialize to RON text, the format of the `material.meta` entry.
    pub fn to_ron(&self) -> Result<String, SchemaError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|err| SchemaError::Malformed(err.to_string()))
    }

    /// Parse a `material.meta` document.
    ///
    /// Fails with [`SchemaError::TypeDenied`] if any variable names a type
    /// outside the allow-list, and with
    /// [`SchemaError::UnsupportedVersion`] for documents from a newer
    /// writer. No partial document is ever returned.
    pub fn from_ron(text: &str) -> Result<Self, SchemaError> {
        let meta: MaterialMeta = ron::from_str(text).map_err(classify_ron_error)?;
        if meta.version > CURRENT_META_VERSION {
            return Err(SchemaError::UnsupportedVersion {
                found: meta.version,
                supported: CURRENT_META_VERSION,
            });
        }
        Ok(meta)
    }
}

/// Message prefix used to smuggle the denied type name through serde's
/// string-typed custom errors, so `from_ron` can classify it.
const TYPE_DENIED_PREFIX: &str = "variable type not allowed: ";

fn classify_ron_error(err: ron::error::SpannedError) -> SchemaError {
    if let ron::Error::Message(msg) = &err.code {
        if let Some(name) = msg.strip_prefix(TYPE_DENIED_PREFIX) {
            return SchemaError::TypeDenied(name.to_owned());
        }
    }
    SchemaError::Malformed(err.to_string())
}

const VARIABLE_FIELDS: &[&str] = &["type", "internal", "value"];

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Variable", 3)?;
        state.serialize_field("type", self.kind().type_name())?;
        state.serialize_field("internal", &self.internal)?;
        // `send_to_shader` is transient and never persisted.
        match &self.value {
            VariableValue::Int(v) => state.serialize_field("value", v)?,
            VariableValue::Float(v) => state.serialize_field("value", v)?,
            VariableValue::Vector2(v) => state.serialize_field("value", v)?,
            VariableValue::Vector3(v) => state.serialize_field("value", v)?,
            VariableValue::Vector4(v) => state.serialize_field("value", v)?,
            VariableValue::Matrix4(v) => state.serialize_field("value", v)?,
            VariableValue::Color(v) => state.serialize_field("value", v)?,
            VariableValue::Texture(v) => state.serialize_field("value", v)?,
            VariableValue::Light(v) => state.serialize_field("value", v)?,
            VariableValue::Unsupported => state.serialize_field("value", &())?,
        }
        state.end()
    }
}

impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Struct field keys arrive as bare identifiers, so they have to be
        // decoded through `deserialize_identifier`, not as strings.
        enum Field {
            Type,
            Internal,
            Value,
        }

        impl<'de> Deserialize<'de> for Field {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                struct FieldVisitor;

                impl Visitor<'_> for FieldVisitor {
                    type Value = Field;

                    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        f.write_str("`type`, `internal` or `value`")
                    }

                    fn visit_str<E: de::Error>(self, field: &str) -> Result<Field, E> {
                        match field {
                            "type" => Ok(Field::Type),
                            "internal" => Ok(Field::Internal),
                            "value" => Ok(Field::Value),
                            other => Err(de::Error::unknown_field(other, VARIABLE_FIELDS)),
                        }
                    }
                }

                deserializer.deserialize_identifier(FieldVisitor)
            }
        }

        struct VariableVisitor;

        impl<'de> Visitor<'de> for VariableVisitor {
            type Value = Variable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a variable as (type, internal, value)")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Variable, A::Error> {
                let mut kind: Option<VariableKind> = None;
                let mut internal = false;
                let mut value: Option<VariableValue> = None;

                while let Some(field) = map.next_key::<Field>()? {
                    match field {
                        Field::Type => {
                            let name: String = map.next_value()?;
                            kind = Some(VariableKind::from_type_name(&name).ok_or_else(|| {
                                de::Error::custom(format!("{TYPE_DENIED_PREFIX}{name}"))
                            })?);
                        }
                        Field::Internal => {
                            internal = map.next_value()?;
                        }
                        Field::Value => {
                            let Some(kind) = kind else {
                                return Err(de::Error::custom(
                                    "'type' must precede 'value' in a variable",
                                ));
                            };
                            value = Some(match kind {
                                VariableKind::Int => VariableValue::Int(map.next_value()?),
                                VariableKind::Float => VariableValue::Float(map.next_value()?),
                                VariableKind::Vector2 => VariableValue::Vector2(map.next_value()?),
                                VariableKind::Vector3 => VariableValue::Vector3(map.next_value()?),
                                VariableKind::Vector4 => VariableValue::Vector4(map.next_value()?),
                                VariableKind::Matrix4 => {
                                    VariableValue::Matrix4(map.next_value::<Mat4>()?)
                                }
                                VariableKind::Color => {
                                    VariableValue::Color(map.next_value::<Color>()?)
                                }
                                VariableKind::Texture => {
                                    VariableValue::Texture(map.next_value::<TextureSlot>()?)
                                }
                                VariableKind::Light => VariableValue::Light(map.next_value()?),
                                VariableKind::Unsupported => {
                                    map.next_value::<()>()?;
                                    VariableValue::Unsupported
                                }
                            });
                        }
                    }
                }

                let kind = kind.ok_or_else(|| de::Error::missing_field("type"))?;
                let value = value.unwrap_or_else(|| kind.default_value());
                // Freshly loaded variables are dirty so the first frame
                // uploads everything.
                Ok(Variable::new(value, internal))
            }
        }

        deserializer.deserialize_struct("Variable", VARIABLE_FIELDS, VariableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    fn sample_meta() -> MaterialMeta {
        let mut meta = MaterialMeta {
            description: "weathered metal".to_owned(),
            author: "ada".to_owned(),
            tags: vec!["metal".to_owned(), "pbr".to_owned()],
            ..Default::default()
        };
        meta.shaders.insert(ShaderStage::Vertex, "base.vert".to_owned());
        meta.shaders.insert(ShaderStage::Fragment, "base.frag".to_owned());
        meta.variables.insert(
            "colDiffuse".to_owned(),
            Variable::new(VariableValue::Color(Color::new(10, 20, 30, 255)), false),
        );
        meta.variables.insert(
            "lightDir".to_owned(),
            Variable::new(VariableValue::Vector3(Vec3::new(0.0, -1.0, 0.25)), false),
        );
        meta.variables.insert(
            "texture0".to_owned(),
            Variable::new(
                VariableValue::Texture(TextureSlot {
                    file: "brick.png".to_owned(),
                    map: Some(crate::variable::MaterialMap::Albedo),
                }),
                false,
            ),
        );
        meta.variables.insert(
            "matModel".to_owned(),
            Variable::new(VariableValue::Matrix4(Mat4::IDENTITY), true),
        );
        meta
    }

    #[test]
    fn ron_round_trip_preserves_document() {
        let meta = sample_meta();
        let text = meta.to_ron().unwrap();
        let loaded = MaterialMeta::from_ron(&text).unwrap();

        assert_eq!(loaded.description, meta.description);
        assert_eq!(loaded.author, meta.author);
        assert_eq!(loaded.tags, meta.tags);
        assert_eq!(loaded.shaders, meta.shaders);
        assert_eq!(loaded.variables, meta.variables);
    }

    #[test]
    fn single_variable_document_round_trips() {
        let mut meta = MaterialMeta::default();
        meta.variables.insert(
            "glow".to_owned(),
            Variable::new(VariableValue::Float(0.5), false),
        );
        let text = meta.to_ron().unwrap();
        let loaded = MaterialMeta::from_ron(&text).unwrap();
        assert_eq!(loaded.variables["glow"].value, VariableValue::Float(0.5));
    }

    #[test]
    fn loaded_variables_are_dirty() {
        let mut meta = sample_meta();
        meta.variables.get_mut("lightDir").unwrap().send_to_shader = false;

        let loaded = MaterialMeta::from_ron(&meta.to_ron().unwrap()).unwrap();
        assert!(loaded.variables["lightDir"].send_to_shader);
    }

    #[test]
    fn vector4_value_round_trips_exactly() {
        let mut meta = MaterialMeta::default();
        meta.variables.insert(
            "offset".to_owned(),
            Variable::new(
                VariableValue::Vector4(Vec4::new(0.1, -2.5, 1e-7, 4096.0)),
                false,
            ),
        );
        let loaded = MaterialMeta::from_ron(&meta.to_ron().unwrap()).unwrap();
        assert_eq!(loaded.variables["offset"].value, meta.variables["offset"].value);
    }

    #[test]
    fn type_outside_allow_list_is_denied() {
        let text = r#"(
    version: 1,
    description: "",
    author: "",
    tags: [],
    shaders: {},
    variables: {
        "evil": (
            type: "System.Diagnostics.Process",
            internal: false,
            value: "calc.exe",
        ),
    },
)"#;
        match MaterialMeta::from_ron(text) {
            Err(SchemaError::TypeDenied(name)) => {
                assert_eq!(name, "System.Diagnostics.Process");
            }
            other => panic!("expected TypeDenied, got {other:?}"),
        }
    }

    #[test]
    fn value_before_type_is_rejected() {
        let text = r#"(
    version: 1,
    description: "",
    author: "",
    tags: [],
    shaders: {},
    variables: {
        "x": (
            value: 1.0,
            type: "Float",
            internal: false,
        ),
    },
)"#;
        assert!(matches!(
            MaterialMeta::from_ron(text),
            Err(SchemaError::Malformed(_))
        ));
    }

    #[test]
    fn missing_value_defaults_by_type() {
        let text = r#"(
    version: 1,
    description: "",
    author: "",
    tags: [],
    shaders: {},
    variables: {
        "tint": (
            type: "Color",
            internal: false,
        ),
    },
)"#;
        let meta = MaterialMeta::from_ron(text).unwrap();
        assert_eq!(
            meta.variables["tint"].value,
            VariableValue::Color(Color::MAGENTA)
        );
    }

    #[test]
    fn future_version_is_rejected() {
        let mut meta = MaterialMeta::default();
        meta.version = CURRENT_META_VERSION + 1;
        let text = meta.to_ron().unwrap();
        assert!(matches!(
            MaterialMeta::from_ron(&text),
            Err(SchemaError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn garbage_text_is_malformed() {
        assert!(matches!(
            MaterialMeta::from_ron("not a document"),
            Err(SchemaError::Malformed(_))
        ));
    }

    #[test]
    fn unsupported_variable_round_trips() {
        let mut meta = MaterialMeta::default();
        meta.variables.insert(
            "volume".to_owned(),
            Variable::new(VariableValue::Unsupported, false),
        );
        let loaded = MaterialMeta::from_ron(&meta.to_ron().unwrap()).unwrap();
        assert_eq!(loaded.variables["volume"].value, VariableValue::Unsupported);
    }
}
