//! Tool configuration loaded from `matpack.toml`.

use std::path::Path;

use serde::Deserialize;

/// Editor/tool configuration.
///
/// All fields have defaults, so a partial (or absent) config file is fine.
///
/// ```toml
/// default_author = "ada"
/// backup_on_save = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Author written into newly created packages.
    pub default_author: String,
    /// Description written into newly created packages.
    pub default_description: String,
    /// Whether saving over an existing package first copies it to `.bck`.
    pub backup_on_save: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            default_author: String::new(),
            default_description: String::new(),
            backup_on_save: true,
        }
    }
}

impl ToolConfig {
    /// Load a config from a TOML file.
    ///
    /// Returns `Err` with a human-readable message if the file cannot be
    /// read or parsed.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse {}: {e}", path.display()))
    }
}
