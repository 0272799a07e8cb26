//! Stage sources backends compile when a material binds no shader of
//! its own, or as the fallback after a failed compile.

pub const DEFAULT_VERTEX_SHADER: &str = include_str!("../shaders/default.vert");
pub const DEFAULT_FRAGMENT_SHADER: &str = include_str!("../shaders/default.frag");

#[cfg(test)]
mod tests {
    use super::*;
    use matpack_core::{parse_uniforms, VariableKind};

    #[test]
    fn default_fragment_declares_the_standard_uniforms() {
        let parsed = parse_uniforms(DEFAULT_FRAGMENT_SHADER).unwrap();
        assert_eq!(parsed.get("colDiffuse"), Some(VariableKind::Color));
        assert_eq!(parsed.get("texture0"), Some(VariableKind::Texture));
    }

    #[test]
    fn default_vertex_only_needs_engine_uniforms() {
        let parsed = parse_uniforms(DEFAULT_VERTEX_SHADER).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.get("mvp"), Some(VariableKind::Matrix4));
    }
}
