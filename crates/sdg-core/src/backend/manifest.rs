//! Backends described by a `backend.yaml` manifest next to their templates.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;

use super::registry::BackendLoader;
use super::{
    Backend, BackendKind, BackendState, ExtendedBackend, SupportingFile, TemplateFiles, is_confined,
};
use crate::error::{BackendLoadError, MissingPackageError};
use crate::ir::grouping::{add_operation_to_group, add_operation_to_tag_group};
use crate::ir::{IrOperation, IrType, OperationGroups};
use crate::transform::ResponseNormalizer;
use crate::transform::name_normalizer::class_name;

/// File name a backend directory must contain.
pub const MANIFEST_FILE_NAME: &str = "backend.yaml";

/// How a manifest backend partitions operations into handler classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// First tag, or `default`.
    #[default]
    Tag,
    /// First path segment of the declaring path.
    ResourcePath,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendManifest {
    pub name: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub kind: BackendKind,
    /// Accepts package, builder and supporting-file configuration.
    #[serde(default)]
    pub extended: bool,
    #[serde(default)]
    pub api_package: Option<String>,
    #[serde(default)]
    pub model_package: Option<String>,
    #[serde(default = "default_api_name_suffix")]
    pub api_name_suffix: String,
    #[serde(default)]
    pub grouping: GroupingStrategy,
    #[serde(default)]
    pub response_envelope: Option<String>,
    #[serde(default)]
    pub api_templates: TemplateFiles,
    #[serde(default)]
    pub model_templates: TemplateFiles,
    /// Replaces `model_templates` in builder mode. Empty means unsupported.
    #[serde(default)]
    pub builder_model_templates: TemplateFiles,
    #[serde(default)]
    pub supporting_files: Vec<SupportingFile>,
    /// IR type keyword → target type.
    #[serde(default)]
    pub type_mapping: IndexMap<String, String>,
    #[serde(default = "default_array_format")]
    pub array_format: String,
    #[serde(default = "default_map_format")]
    pub map_format: String,
}

fn default_api_name_suffix() -> String {
    "Api".to_string()
}

fn default_array_format() -> String {
    "List<{}>".to_string()
}

fn default_map_format() -> String {
    "Map<String, {}>".to_string()
}

impl BackendManifest {
    pub fn from_yaml(input: &str) -> Result<Self, serde_yaml_ng::Error> {
        serde_yaml_ng::from_str(input)
    }

    /// Every template file the manifest refers to.
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.api_templates
            .keys()
            .chain(self.model_templates.keys())
            .chain(self.builder_model_templates.keys())
            .map(String::as_str)
            .chain(self.supporting_files.iter().map(|f| f.template.as_str()))
    }

    /// The first template name, file suffix or supporting-file location that leaves its base directory.
    pub fn escaping_path(&self) -> Option<String> {
        if let Some(name) = self.template_names().find(|name| !is_confined(name)) {
            return Some(name.to_string());
        }
        let suffixes = self
            .api_templates
            .values()
            .chain(self.model_templates.values())
            .chain(self.builder_model_templates.values());
        if let Some(suffix) = suffixes.into_iter().find(|s| !is_confined(format!("File{s}"))) {
            return Some(suffix.clone());
        }
        self.supporting_files
            .iter()
            .find(|f| f.relative_path().is_none())
            .map(|f| Path::new(&f.folder).join(&f.destination).display().to_string())
    }
}

/// A backend whose behavior comes entirely from its manifest and templates.
#[derive(Debug, Clone)]
pub struct ManifestBackend {
    manifest: BackendManifest,
    templates: IndexMap<String, String>,
    state: BackendState,
    model_templates: TemplateFiles,
    exclude_supporting_files: bool,
    normalizer: Option<ResponseNormalizer>,
}

impl ManifestBackend {
    /// Build from an already-parsed manifest and its template sources.
    pub fn new(manifest: BackendManifest, templates: IndexMap<String, String>) -> Self {
        let state = BackendState {
            api_package: manifest.api_package.clone(),
            model_package: manifest.model_package.clone(),
            ..BackendState::default()
        };
        Self {
            model_templates: manifest.model_templates.clone(),
            normalizer: manifest
                .response_envelope
                .as_deref()
                .map(ResponseNormalizer::new),
            manifest,
            templates,
            state,
            exclude_supporting_files: false,
        }
    }

    /// Load a backend from a directory holding `backend.yaml`, or from the manifest itself.
    pub fn load(location: &Path) -> Result<Self, BackendLoadError> {
        let manifest_path = if location.is_dir() {
            location.join(MANIFEST_FILE_NAME)
        } else {
            location.to_path_buf()
        };
        if !manifest_path.is_file() {
            return Err(BackendLoadError::NotFound(manifest_path));
        }
        let dir = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let content = read(&manifest_path)?;
        let manifest =
            BackendManifest::from_yaml(&content).map_err(|source| BackendLoadError::Manifest {
                path: manifest_path.clone(),
                source,
            })?;

        if let Some(path) = manifest.escaping_path() {
            return Err(BackendLoadError::EscapingPath {
                manifest: manifest_path,
                path,
            });
        }

        let mut templates: IndexMap<String, String> = IndexMap::new();
        for name in manifest.template_names() {
            if templates.contains_key(name) {
                continue;
            }
            let path = dir.join(name);
            if !path.is_file() {
                return Err(BackendLoadError::MissingTemplate {
                    manifest: manifest_path,
                    template: name.to_string(),
                });
            }
            templates.insert(name.to_string(), read(&path)?);
        }

        debug!(
            "loaded backend '{}' from {} ({} templates)",
            manifest.name,
            manifest_path.display(),
            templates.len()
        );
        Ok(Self::new(manifest, templates))
    }

    pub fn manifest(&self) -> &BackendManifest {
        &self.manifest
    }
}

fn read(path: &Path) -> Result<String, BackendLoadError> {
    fs::read_to_string(path).map_err(|source| BackendLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Backend for ManifestBackend {
    fn name(&self) -> &str {
        &self.manifest.name
    }

    fn help(&self) -> &str {
        &self.manifest.help
    }

    fn kind(&self) -> BackendKind {
        self.manifest.kind
    }

    fn state(&self) -> &BackendState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BackendState {
        &mut self.state
    }

    fn api_template_files(&self) -> &TemplateFiles {
        &self.manifest.api_templates
    }

    fn model_template_files(&self) -> &TemplateFiles {
        &self.model_templates
    }

    fn supporting_files(&self) -> Result<Vec<SupportingFile>, MissingPackageError> {
        if self.exclude_supporting_files {
            return Ok(Vec::new());
        }
        Ok(self.manifest.supporting_files.clone())
    }

    fn templates(&self) -> Vec<(&str, &str)> {
        self.templates
            .iter()
            .map(|(name, source)| (name.as_str(), source.as_str()))
            .collect()
    }

    fn template_source(&self, name: &str) -> Option<&str> {
        self.templates.get(name).map(String::as_str)
    }

    fn type_declaration(&self, ty: &IrType) -> String {
        match ty {
            IrType::Array(inner) => self
                .manifest
                .array_format
                .replace("{}", &self.type_declaration(inner)),
            IrType::Map(inner) => self
                .manifest
                .map_format
                .replace("{}", &self.type_declaration(inner)),
            IrType::Ref(name) => self.to_model_name(name),
            other => self
                .manifest
                .type_mapping
                .get(other.keyword())
                .cloned()
                .unwrap_or_else(|| other.keyword().to_string()),
        }
    }

    fn to_api_name(&self, group: &str) -> String {
        class_name(group, &self.manifest.api_name_suffix)
    }

    fn add_operation_to_group(
        &self,
        groups: &mut OperationGroups,
        declaring_path: &str,
        op: IrOperation,
    ) {
        match self.manifest.grouping {
            GroupingStrategy::Tag => add_operation_to_tag_group(groups, op),
            GroupingStrategy::ResourcePath => add_operation_to_group(groups, declaring_path, op),
        }
    }

    fn post_process_operations(&self, ops: &mut [IrOperation]) {
        if let Some(normalizer) = &self.normalizer {
            normalizer.normalize_all(ops.iter_mut());
        }
    }

    fn extended(&mut self) -> Option<&mut dyn ExtendedBackend> {
        if self.manifest.extended {
            Some(self)
        } else {
            None
        }
    }
}

impl ExtendedBackend for ManifestBackend {
    fn set_api_package(&mut self, package: &str) {
        self.state.api_package = Some(package.to_string());
    }

    fn set_model_package(&mut self, package: &str) {
        self.state.model_package = Some(package.to_string());
    }

    fn is_builder_supported(&self) -> bool {
        !self.manifest.builder_model_templates.is_empty()
    }

    fn enable_builder_support(&mut self) {
        if self.is_builder_supported() {
            self.model_templates = self.manifest.builder_model_templates.clone();
        }
    }

    fn exclude_supporting_files(&mut self) {
        self.exclude_supporting_files = true;
    }
}

/// Loads a backend from a path naming a manifest or its directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestLoader;

impl BackendLoader for ManifestLoader {
    fn load(&self, identifier: &str) -> Result<Box<dyn Backend>, BackendLoadError> {
        let backend = ManifestBackend::load(Path::new(identifier))?;
        Ok(Box::new(backend))
    }
}
