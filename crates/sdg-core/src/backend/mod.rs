pub mod manifest;
pub mod registry;

use std::fmt;
use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::{Properties, non_blank};
use crate::error::{MissingPackageError, PackageScope};
use crate::ir::grouping::add_operation_to_tag_group;
use crate::ir::{IrOperation, IrType, OperationGroups};
use crate::package::{package_to_path, require};
use crate::transform::name_normalizer::{class_name, normalize_name};

pub use manifest::{BackendManifest, GroupingStrategy, ManifestBackend, ManifestLoader};

/// Template file name → output file suffix.
pub type TemplateFiles = IndexMap<String, String>;

/// True when `path` is relative and never climbs above its base directory.
pub fn is_confined(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// What a backend produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[default]
    Server,
    Client,
    Documentation,
    Other,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Server => write!(f, "server"),
            BackendKind::Client => write!(f, "client"),
            BackendKind::Documentation => write!(f, "documentation"),
            BackendKind::Other => write!(f, "other"),
        }
    }
}

/// A file rendered once per document rather than once per model or group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingFile {
    pub template: String,
    /// Folder relative to the output directory.
    #[serde(default)]
    pub folder: String,
    pub destination: String,
}

impl SupportingFile {
    pub fn new(
        template: impl Into<String>,
        folder: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            template: template.into(),
            folder: folder.into(),
            destination: destination.into(),
        }
    }

    /// Output path relative to the output directory, unless it would escape it.
    pub fn relative_path(&self) -> Option<PathBuf> {
        let path = Path::new(&self.folder).join(&self.destination);
        (!self.destination.is_empty() && is_confined(&path)).then_some(path)
    }
}

/// State every backend carries between configuration and emission.
#[derive(Debug, Clone, Default)]
pub struct BackendState {
    pub properties: Properties,
    pub output_dir: PathBuf,
    pub api_package: Option<String>,
    pub model_package: Option<String>,
}

/// A code-emission backend: templates, naming and type conventions for one target.
pub trait Backend {
    /// Registry key.
    fn name(&self) -> &str;

    fn help(&self) -> &str;

    fn kind(&self) -> BackendKind;

    fn state(&self) -> &BackendState;

    fn state_mut(&mut self) -> &mut BackendState;

    fn properties(&self) -> &Properties {
        &self.state().properties
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.state_mut().properties
    }

    fn output_dir(&self) -> &Path {
        &self.state().output_dir
    }

    fn set_output_dir(&mut self, dir: PathBuf) {
        self.state_mut().output_dir = dir;
    }

    fn api_package(&self) -> Option<&str> {
        non_blank(self.state().api_package.as_deref())
    }

    fn model_package(&self) -> Option<&str> {
        non_blank(self.state().model_package.as_deref())
    }

    /// Folder API classes are written to. Fails when the API package is blank.
    fn api_file_folder(&self) -> Result<PathBuf, MissingPackageError> {
        let package = require(PackageScope::Api, self.api_package())?;
        Ok(self.output_dir().join(package_to_path(package)))
    }

    /// Folder model classes are written to. Fails when the model package is blank.
    fn model_file_folder(&self) -> Result<PathBuf, MissingPackageError> {
        let package = require(PackageScope::Model, self.model_package())?;
        Ok(self.output_dir().join(package_to_path(package)))
    }

    fn api_template_files(&self) -> &TemplateFiles;

    fn model_template_files(&self) -> &TemplateFiles;

    fn supporting_files(&self) -> Result<Vec<SupportingFile>, MissingPackageError>;

    /// Every template this backend ships, as (file name, source).
    fn templates(&self) -> Vec<(&str, &str)>;

    /// Source of a template by file name.
    fn template_source(&self, name: &str) -> Option<&str> {
        self.templates()
            .into_iter()
            .find(|(template, _)| *template == name)
            .map(|(_, source)| source)
    }

    /// Target-language spelling of a type.
    fn type_declaration(&self, ty: &IrType) -> String;

    /// Handler class name for a group.
    fn to_api_name(&self, group: &str) -> String {
        class_name(group, "Api")
    }

    fn to_model_name(&self, name: &str) -> String {
        normalize_name(name).pascal_case
    }

    /// Place an operation in its group. Groups by first tag unless overridden.
    fn add_operation_to_group(
        &self,
        groups: &mut OperationGroups,
        _declaring_path: &str,
        op: IrOperation,
    ) {
        add_operation_to_tag_group(groups, op);
    }

    /// Rewrite operations of one group before rendering.
    fn post_process_operations(&self, _ops: &mut [IrOperation]) {}

    /// The extended capability set, when this backend implements it.
    fn extended(&mut self) -> Option<&mut dyn ExtendedBackend> {
        None
    }
}

/// Backends that accept package overrides, builder mode and supporting-file exclusion.
pub trait ExtendedBackend {
    fn set_api_package(&mut self, package: &str);

    fn set_model_package(&mut self, package: &str);

    fn is_builder_supported(&self) -> bool;

    fn enable_builder_support(&mut self);

    fn exclude_supporting_files(&mut self);
}
