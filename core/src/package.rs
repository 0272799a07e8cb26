//! The material package engine.
//!
//! [`MaterialPackage`] is the aggregate root of one editable material: the
//! in-memory file table, the reference-count index over it, the metadata
//! document, and a `modified` dirty flag. It owns the variable
//! synchronization algorithm that keeps the variable dictionary consistent
//! with whatever the active shader sources declare.
//!
//! Change notification is by return value: mutating operations return
//! `Result`s and [`SyncReport`]s that the caller inspects, instead of firing
//! callbacks mid-mutation.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::ToolConfig;
use crate::error::PackageError;
use crate::file::FileId;
use crate::meta::{MaterialMeta, ShaderStage, CURRENT_META_VERSION, META_ENTRY_NAME};
use crate::parser::{parse_uniforms, ParsedUniforms};
use crate::variable::{is_engine_managed, Variable, VariableValue};
use matpack_store::{ArchiveStore, EntryStore};

/// What a variable synchronization changed.
///
/// Names appear in declaration order for `added` and `retyped`, and in
/// dictionary order for `removed`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Uniform names that gained a freshly defaulted variable.
    pub added: Vec<String>,
    /// Names whose variable was replaced because the declared type changed.
    pub retyped: Vec<String>,
    /// Names whose variable was removed because no active shader declares
    /// them anymore.
    pub removed: Vec<String>,
}

impl SyncReport {
    /// Whether the synchronization was a no-op.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.retyped.is_empty() && self.removed.is_empty()
    }
}

/// One editable material: files, variables, metadata, dirty state.
#[derive(Debug, Default)]
pub struct MaterialPackage {
    meta: MaterialMeta,
    files: BTreeMap<FileId, Vec<u8>>,
    references: BTreeMap<FileId, u32>,
    modified: bool,
    backup_on_save: bool,
}

impl MaterialPackage {
    /// Create an empty package.
    pub fn new() -> Self {
        Self {
            backup_on_save: true,
            ..Default::default()
        }
    }

    /// Create an empty package seeded from tool config (author, description,
    /// backup behavior).
    pub fn with_config(config: &ToolConfig) -> Self {
        let mut package = Self::new();
        package.meta.author = config.default_author.clone();
        package.meta.description = config.default_description.clone();
        package.backup_on_save = config.backup_on_save;
        package
    }

    // --- metadata ---------------------------------------------------------

    /// The metadata document.
    pub fn meta(&self) -> &MaterialMeta {
        &self.meta
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.meta.description = description.into();
        self.modified = true;
    }

    pub fn set_author(&mut self, author: impl Into<String>) {
        self.meta.author = author.into();
        self.modified = true;
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.meta.tags = tags;
        self.modified = true;
    }

    /// Whether the package has unsaved changes. Cleared only by a
    /// successful save.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    // --- files ------------------------------------------------------------

    /// Add a file to the package. The [`FileKind`](crate::FileKind) is
    /// inferred from the
    /// extension once, here. Fails if the exact FileId already exists —
    /// adding never overwrites.
    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<FileId, PackageError> {
        let id = FileId::from_name(name);
        if id.name() == META_ENTRY_NAME {
            log::error!("add_file: '{}' is a reserved entry name", id.name());
            return Err(PackageError::ReservedName(id.name().to_owned()));
        }
        if self.files.contains_key(&id) {
            log::error!("add_file: '{id}' already exists");
            return Err(PackageError::FileExists(id.name().to_owned()));
        }
        self.references.insert(id.clone(), 0);
        self.files.insert(id.clone(), bytes);
        self.modified = true;
        Ok(id)
    }

    /// Replace a file's content. The id stays stable and reference counts
    /// are unaffected. The file must already exist.
    pub fn update_file(&mut self, id: &FileId, bytes: Vec<u8>) -> Result<(), PackageError> {
        let Some(content) = self.files.get_mut(id) else {
            return Err(PackageError::FileNotFound(id.name().to_owned()));
        };
        *content = bytes;
        self.modified = true;
        Ok(())
    }

    /// Remove a file. Fails if the file is still referenced by an active
    /// shader binding or a texture variable — the caller must unbind first.
    pub fn delete_file(&mut self, id: &FileId) -> Result<(), PackageError> {
        let count = self.reference_count(id);
        if count > 0 {
            return Err(PackageError::FileReferenced {
                name: id.name().to_owned(),
                count,
            });
        }
        if self.files.remove(id).is_none() {
            return Err(PackageError::FileNotFound(id.name().to_owned()));
        }
        self.references.remove(id);
        self.modified = true;
        Ok(())
    }

    /// A file's raw bytes.
    pub fn file(&self, id: &FileId) -> Option<&[u8]> {
        self.files.get(id).map(Vec::as_slice)
    }

    /// Iterate all file entries.
    pub fn files(&self) -> impl Iterator<Item = (&FileId, &[u8])> {
        self.files.iter().map(|(id, bytes)| (id, bytes.as_slice()))
    }

    /// Number of file entries.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// How many live bindings point at a file. Zero means deletable.
    pub fn reference_count(&self, id: &FileId) -> u32 {
        self.references.get(id).copied().unwrap_or(0)
    }

    // --- shader bindings --------------------------------------------------

    /// Bind a shader file as the active shader for its stage.
    ///
    /// Activation only rebinds; the caller follows up with
    /// [`refresh_variables`](Self::refresh_variables) to re-parse and
    /// re-synchronize.
    pub fn activate_shader(&mut self, id: &FileId) -> Result<(), PackageError> {
        if !self.files.contains_key(id) {
            return Err(PackageError::FileNotFound(id.name().to_owned()));
        }
        let Some(stage) = ShaderStage::for_file_kind(id.kind()) else {
            return Err(PackageError::NotAShader(id.name().to_owned()));
        };
        self.meta.shaders.insert(stage, id.name().to_owned());
        self.update_file_references();
        self.modified = true;
        Ok(())
    }

    /// The active shader file for a stage, if one is bound and present.
    /// A stored name whose kind does not match the stage (possible in a
    /// hand-edited document) is treated as unbound.
    pub fn active_shader(&self, stage: ShaderStage) -> Option<FileId> {
        let name = self.meta.shaders.get(&stage)?;
        let id = FileId::from_name(name.clone());
        (id.kind() == stage.file_kind() && self.files.contains_key(&id)).then_some(id)
    }

    /// The active shader's source text for a stage.
    pub fn shader_source(&self, stage: ShaderStage) -> Result<Option<String>, PackageError> {
        let Some(id) = self.active_shader(stage) else {
            return Ok(None);
        };
        let bytes = self.files[&id].clone();
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| PackageError::ShaderNotText(id.name().to_owned()))
    }

    // --- variables --------------------------------------------------------

    /// The variable dictionary.
    pub fn variables(&self) -> &BTreeMap<String, Variable> {
        &self.meta.variables
    }

    /// One variable by uniform name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.meta.variables.get(name)
    }

    /// Assign a variable's value. The new value must be of the variable's
    /// current type; the type itself only ever changes through
    /// synchronization against shader source. Marks the variable dirty.
    pub fn set_variable_value(
        &mut self,
        name: &str,
        value: VariableValue,
    ) -> Result<(), PackageError> {
        let Some(var) = self.meta.variables.get_mut(name) else {
            return Err(PackageError::VariableNotFound(name.to_owned()));
        };
        if var.kind() != value.kind() {
            return Err(PackageError::VariableTypeMismatch {
                name: name.to_owned(),
                current: var.kind().type_name(),
                proposed: value.kind().type_name(),
            });
        }
        let texture_changed = matches!(value, VariableValue::Texture(_)) && var.value != value;
        var.value = value;
        var.send_to_shader = true;
        self.modified = true;
        if texture_changed {
            self.update_file_references();
        }
        Ok(())
    }

    /// Mutable iteration over variables, for the runtime's upload pass
    /// (reading values and clearing `send_to_shader`). Does not touch the
    /// modified flag.
    pub fn variables_mut(&mut self) -> impl Iterator<Item = (&str, &mut Variable)> {
        self.meta
            .variables
            .iter_mut()
            .map(|(name, var)| (name.as_str(), var))
    }

    /// Re-parse the active shader sources and synchronize the variable
    /// dictionary against them.
    ///
    /// Parsing happens before any mutation: a malformed shader aborts with
    /// the previous variable set fully intact. With no active shaders the
    /// parsed set is empty and all variables are removed.
    pub fn refresh_variables(&mut self) -> Result<SyncReport, PackageError> {
        let mut parsed = ParsedUniforms::default();
        if let Some(source) = self.shader_source(ShaderStage::Vertex)? {
            parsed.merge(parse_uniforms(&source)?);
        }
        if let Some(source) = self.shader_source(ShaderStage::Fragment)? {
            parsed.merge(parse_uniforms(&source)?);
        }
        Ok(self.synchronize(&parsed))
    }

    /// The synchronization algorithm: reconcile the stored variables with
    /// the parsed uniform set. Three passes, in a fixed order:
    ///
    /// 1. names only in the parsed set gain a default-initialized variable;
    /// 2. names in both are retyped (value discarded) if the declared type
    ///    changed, or get their `internal` flag corrected in place;
    /// 3. names absent from the parsed set are removed.
    ///
    /// Afterwards the variable key set equals the parsed key set, values of
    /// unchanged-type variables are untouched, and running the same
    /// synchronization again is a no-op.
    fn synchronize(&mut self, parsed: &ParsedUniforms) -> SyncReport {
        let mut report = SyncReport::default();

        for (name, kind) in parsed.iter() {
            let internal = is_engine_managed(name, kind);
            match self.meta.variables.get_mut(name) {
                None => {
                    self.meta
                        .variables
                        .insert(name.to_owned(), Variable::of_kind(kind, internal));
                    report.added.push(name.to_owned());
                }
                Some(var) if var.kind() != kind => {
                    *var = Variable::of_kind(kind, internal);
                    report.retyped.push(name.to_owned());
                }
                Some(var) => {
                    // A corrected flag is persisted state too, so it must
                    // count as a modification even though the report only
                    // tracks added/retyped/removed names.
                    if var.internal != internal {
                        var.internal = internal;
                        self.modified = true;
                    }
                }
            }
        }

        let stale: Vec<String> = self
            .meta
            .variables
            .keys()
            .filter(|name| parsed.get(name).is_none())
            .cloned()
            .collect();
        for name in stale {
            self.meta.variables.remove(&name);
            report.removed.push(name);
        }

        self.update_file_references();
        if !report.is_empty() {
            self.modified = true;
        }
        report
    }

    /// Rebuild the reference-count index from scratch: the active shader of
    /// each stage counts 1, and every bound texture variable counts 1
    /// against its image file. A full rebuild is deliberate — cheap at
    /// package scale, and immune to drift.
    pub fn update_file_references(&mut self) {
        for count in self.references.values_mut() {
            *count = 0;
        }

        for (stage, name) in &self.meta.shaders {
            let id = FileId::from_name(name.clone());
            if id.kind() == stage.file_kind() {
                if let Some(count) = self.references.get_mut(&id) {
                    *count += 1;
                }
            }
        }

        let mut texture_files = Vec::new();
        for var in self.meta.variables.values() {
            if let VariableValue::Texture(slot) = &var.value {
                if slot.is_bound() {
                    texture_files.push(FileId::from_name(slot.file.clone()));
                }
            }
        }
        for id in texture_files {
            if let Some(count) = self.references.get_mut(&id) {
                *count += 1;
            }
        }
    }

    // --- persistence ------------------------------------------------------

    /// Serialize the package into a container: the metadata document as the
    /// `material.meta` entry plus every file entry under its own name.
    pub fn save_to(&mut self, store: &mut dyn EntryStore) -> Result<(), PackageError> {
        self.meta.version = CURRENT_META_VERSION;
        let text = self.meta.to_ron()?;
        store.write_text_entry(META_ENTRY_NAME, &text)?;
        for (id, bytes) in &self.files {
            store.write_entry(id.name(), bytes)?;
        }
        store.finish()?;
        self.modified = false;
        Ok(())
    }

    /// Save as a compressed archive at `path`, backing up any previous file
    /// first (unless disabled via config).
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), PackageError> {
        let path = path.as_ref();
        let mut store = ArchiveStore::create(path, self.backup_on_save);
        self.save_to(&mut store)?;
        log::info!("saved material package to {}", path.display());
        Ok(())
    }

    /// Rebuild a package from a container. Any failure — missing or
    /// malformed metadata, a denied variable type, a corrupt entry — aborts
    /// the whole load; no partial package is returned.
    pub fn load_from(store: &mut dyn EntryStore) -> Result<Self, PackageError> {
        let text = store.read_text_entry(META_ENTRY_NAME)?;
        let meta = MaterialMeta::from_ron(&text)?;

        let mut files = BTreeMap::new();
        let mut references = BTreeMap::new();
        for name in store.entry_names() {
            if name == META_ENTRY_NAME {
                continue;
            }
            let bytes = store.read_entry(&name)?;
            let id = FileId::from_name(name);
            references.insert(id.clone(), 0);
            files.insert(id, bytes);
        }

        let mut package = Self {
            meta,
            files,
            references,
            modified: false,
            backup_on_save: true,
        };
        package.update_file_references();
        Ok(package)
    }

    /// Load a package from a compressed archive at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PackageError> {
        let path = path.as_ref();
        let mut store = ArchiveStore::open(path)?;
        let package = Self::load_from(&mut store)?;
        log::info!(
            "loaded material package from {} ({} files, {} variables)",
            path.display(),
            package.file_count(),
            package.variables().len()
        );
        Ok(package)
    }
}
