//! GLSL uniform declaration scanner.
//!
//! The only shader syntax the package engine depends on is the uniform
//! declaration `uniform <type> <name>;` — one declaration per statement,
//! C-like identifiers, terminating semicolon. The scanner finds every
//! line-anchored `uniform` keyword and requires each to complete that
//! grammar; a keyword that does not is a [`ParseError`] for the whole source
//! file, so a half-edited shader never mutates the variable set.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::variable::VariableKind;

/// A `uniform` keyword that does not complete `uniform <type> <name>;`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed uniform declaration at line {line}")]
pub struct ParseError {
    /// 1-based source line of the offending declaration.
    pub line: usize,
}

/// Anchors on lines that start a uniform declaration.
fn keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*uniform\b").unwrap())
}

/// The full declaration grammar, applied at each keyword position.
/// Whitespace between tokens may span lines.
fn declaration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[ \t]*uniform\s+([A-Za-z_][A-Za-z0-9_]*)\s+([A-Za-z_][A-Za-z0-9_]*)\s*;")
            .unwrap()
    })
}

/// Map a GLSL type token to a variable type.
fn kind_for_glsl_type(glsl_type: &str) -> Option<VariableKind> {
    match glsl_type {
        "float" => Some(VariableKind::Float),
        "int" | "uint" => Some(VariableKind::Int),
        "vec2" => Some(VariableKind::Vector2),
        "vec3" => Some(VariableKind::Vector3),
        "vec4" => Some(VariableKind::Vector4),
        "mat4" => Some(VariableKind::Matrix4),
        "sampler2D" => Some(VariableKind::Texture),
        "Light" => Some(VariableKind::Light),
        _ => None,
    }
}

/// `vec4` uniforms with color-like names are treated as colors: same bit
/// layout, but edited and defaulted as a color.
fn looks_like_color(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("color") || lower.starts_with("col")
}

/// Uniforms parsed from one or more shader sources, in declaration order.
///
/// Behaves as a mapping with unique names. A name declared more than once
/// keeps its first position but takes the type of the last declaration
/// (logged, since the shadowing is usually unintentional).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedUniforms {
    entries: Vec<(String, VariableKind)>,
}

impl ParsedUniforms {
    /// The inferred type for a uniform name, if declared.
    pub fn get(&self, name: &str) -> Option<VariableKind> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, kind)| *kind)
    }

    /// Iterate `(name, kind)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, VariableKind)> {
        self.entries.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    /// Number of distinct uniform names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: String, kind: VariableKind) {
        if let Some(entry) = self.entries.iter_mut().find(|(candidate, _)| *candidate == name) {
            if entry.1 != kind {
                log::warn!(
                    "uniform '{name}' declared more than once; keeping the last type ({kind:?})"
                );
            }
            entry.1 = kind;
        } else {
            self.entries.push((name, kind));
        }
    }

    /// Fold another parse result into this one, with the same last-wins rule
    /// for names declared in both. Used to combine the vertex and fragment
    /// stages into one variable namespace.
    pub fn merge(&mut self, other: ParsedUniforms) {
        for (name, kind) in other.entries {
            self.insert(name, kind);
        }
    }
}

/// Scan GLSL source for uniform declarations.
///
/// Returns the ordered name → type mapping, or the first malformed
/// declaration as a [`ParseError`]. A declaration whose GLSL type has no
/// table entry produces a [`VariableKind::Unsupported`] variable and a
/// warning rather than an error, so one exotic uniform does not invalidate
/// the shader.
pub fn parse_uniforms(source: &str) -> Result<ParsedUniforms, ParseError> {
    let mut parsed = ParsedUniforms::default();

    for keyword in keyword_regex().find_iter(source) {
        let rest = &source[keyword.start()..];
        let Some(captures) = declaration_regex().captures(rest) else {
            return Err(ParseError {
                line: source[..keyword.start()].matches('\n').count() + 1,
            });
        };
        let glsl_type = &captures[1];
        let name = &captures[2];

        let mut kind = match kind_for_glsl_type(glsl_type) {
            Some(kind) => kind,
            None => {
                log::warn!("uniform '{name}' has unsupported GLSL type '{glsl_type}'");
                VariableKind::Unsupported
            }
        };
        if kind == VariableKind::Vector4 && looks_like_color(name) {
            kind = VariableKind::Color;
        }

        parsed.insert(name.to_owned(), kind);
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_declarations() {
        let source = "\
#version 330
uniform float time;
uniform int frame;
uniform vec2 resolution;
uniform vec3 lightDir;
uniform mat4 matModel;
void main() {}
";
        let parsed = parse_uniforms(source).unwrap();
        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed.get("time"), Some(VariableKind::Float));
        assert_eq!(parsed.get("frame"), Some(VariableKind::Int));
        assert_eq!(parsed.get("resolution"), Some(VariableKind::Vector2));
        assert_eq!(parsed.get("lightDir"), Some(VariableKind::Vector3));
        assert_eq!(parsed.get("matModel"), Some(VariableKind::Matrix4));
    }

    #[test]
    fn declaration_order_is_source_order() {
        let parsed = parse_uniforms("uniform float b;\nuniform float a;\n").unwrap();
        let names: Vec<&str> = parsed.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn color_heuristic_overrides_vec4() {
        let parsed = parse_uniforms("uniform vec4 colDiffuse;\n").unwrap();
        assert_eq!(parsed.get("colDiffuse"), Some(VariableKind::Color));

        let parsed = parse_uniforms("uniform vec4 tintColor;\n").unwrap();
        assert_eq!(parsed.get("tintColor"), Some(VariableKind::Color));

        let parsed = parse_uniforms("uniform vec4 offset;\n").unwrap();
        assert_eq!(parsed.get("offset"), Some(VariableKind::Vector4));
    }

    #[test]
    fn heuristic_only_applies_to_vec4() {
        let parsed = parse_uniforms("uniform vec3 colDirection;\n").unwrap();
        assert_eq!(parsed.get("colDirection"), Some(VariableKind::Vector3));
    }

    #[test]
    fn sampler_becomes_texture() {
        let parsed = parse_uniforms("uniform sampler2D texture0;\n").unwrap();
        assert_eq!(parsed.get("texture0"), Some(VariableKind::Texture));
    }

    #[test]
    fn light_type_is_recognized() {
        let parsed = parse_uniforms("uniform Light sun;\n").unwrap();
        assert_eq!(parsed.get("sun"), Some(VariableKind::Light));
    }

    #[test]
    fn uint_maps_to_int() {
        let parsed = parse_uniforms("uniform uint seed;\n").unwrap();
        assert_eq!(parsed.get("seed"), Some(VariableKind::Int));
    }

    #[test]
    fn unknown_type_is_unsupported() {
        let parsed = parse_uniforms("uniform sampler3D volume;\n").unwrap();
        assert_eq!(parsed.get("volume"), Some(VariableKind::Unsupported));
    }

    #[test]
    fn whitespace_tolerance() {
        let parsed = parse_uniforms("  uniform\n    vec3\n    lightDir\n  ;\n").unwrap();
        assert_eq!(parsed.get("lightDir"), Some(VariableKind::Vector3));
    }

    #[test]
    fn missing_semicolon_is_parse_error() {
        let source = "uniform float time;\nuniform vec3 lightDir\nvoid main() {}\n";
        let err = parse_uniforms(source).unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn missing_name_is_parse_error() {
        let err = parse_uniforms("uniform float;\n").unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn bare_keyword_is_parse_error() {
        let err = parse_uniforms("void main() {}\nuniform\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn keyword_must_start_the_line() {
        // `uniform` buried in an expression or comment body is not a
        // declaration start.
        let parsed = parse_uniforms("int x = uniform_lookup();\n").unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn duplicate_name_last_type_wins() {
        let parsed = parse_uniforms("uniform float value;\nuniform vec3 value;\n").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get("value"), Some(VariableKind::Vector3));
    }

    #[test]
    fn merge_is_last_wins_across_stages() {
        let mut vertex = parse_uniforms("uniform mat4 mvp;\nuniform float shared;\n").unwrap();
        let fragment = parse_uniforms("uniform vec4 colDiffuse;\nuniform int shared;\n").unwrap();
        vertex.merge(fragment);

        assert_eq!(vertex.len(), 3);
        assert_eq!(vertex.get("shared"), Some(VariableKind::Int));
        let names: Vec<&str> = vertex.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["mvp", "shared", "colDiffuse"]);
    }
}
