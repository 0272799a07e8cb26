//! Package file identity.
//!
//! Every entry bundled in a package is keyed by a [`FileId`]: the file's
//! role ([`FileKind`], inferred from its extension once at insertion) plus
//! its name. The extension table is part of the package format contract.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a file inside a package, inferred from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Unknown,
    VertexShader,
    FragmentShader,
    Image,
}

impl FileKind {
    /// Infer the kind from a file name. The table is fixed:
    /// `.png`/`.jpg` → Image, `.vert` → VertexShader, `.frag` →
    /// FragmentShader, anything else → Unknown. Extension matching is
    /// case-insensitive.
    pub fn from_name(name: &str) -> Self {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "png" | "jpg" => FileKind::Image,
            "vert" => FileKind::VertexShader,
            "frag" => FileKind::FragmentShader,
            _ => FileKind::Unknown,
        }
    }

    /// Whether this kind is a shader stage.
    pub fn is_shader(self) -> bool {
        matches!(self, FileKind::VertexShader | FileKind::FragmentShader)
    }
}

/// Composite key identifying one file entry within a package.
///
/// Immutable once created: updating a file's content keeps its id, and
/// renaming is modeled as delete + add.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId {
    kind: FileKind,
    name: String,
}

impl FileId {
    /// Build the id for a file name, inferring its kind from the extension.
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: FileKind::from_name(&name),
            name,
        }
    }

    /// The file's role.
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    /// The file's name, as addressed inside the container.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.name, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_table() {
        assert_eq!(FileKind::from_name("brick.png"), FileKind::Image);
        assert_eq!(FileKind::from_name("brick.jpg"), FileKind::Image);
        assert_eq!(FileKind::from_name("base.vert"), FileKind::VertexShader);
        assert_eq!(FileKind::from_name("base.frag"), FileKind::FragmentShader);
        assert_eq!(FileKind::from_name("notes.txt"), FileKind::Unknown);
        assert_eq!(FileKind::from_name("no_extension"), FileKind::Unknown);
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(FileKind::from_name("BRICK.PNG"), FileKind::Image);
        assert_eq!(FileKind::from_name("base.VERT"), FileKind::VertexShader);
    }

    #[test]
    fn same_name_different_kind_is_different_id() {
        let image = FileId::from_name("asset.png");
        let other = FileId::from_name("asset.txt");
        assert_ne!(image, other);
        assert_eq!(image.kind(), FileKind::Image);
        assert_eq!(other.kind(), FileKind::Unknown);
    }
}
