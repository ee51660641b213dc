use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use crate::error::ConfigError;

/// Backend-specific key/value overrides.
pub type Properties = IndexMap<String, serde_json::Value>;

/// Name of the backend used when none is configured.
pub const DEFAULT_BACKEND: &str = "custom-spring";

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".sdg.yaml";

/// Environment variable listing extra backend plugin directories.
pub const BACKEND_PATH_ENV: &str = "SDG_BACKEND_PATH";

/// One specification document and the packages its code lands in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SpecInfo {
    /// Local path or `http(s)` URL of the document.
    pub source: String,
    pub api_package: Option<String>,
    pub model_package: Option<String>,
    pub skip_api: bool,
    pub skip_model: bool,
}

impl SpecInfo {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn with_api_package(mut self, package: impl Into<String>) -> Self {
        self.api_package = Some(package.into());
        self
    }

    pub fn with_model_package(mut self, package: impl Into<String>) -> Self {
        self.model_package = Some(package.into());
        self
    }

    pub fn skip_api(mut self, skip: bool) -> Self {
        self.skip_api = skip;
        self
    }

    pub fn skip_model(mut self, skip: bool) -> Self {
        self.skip_model = skip;
        self
    }

    /// The API package, if set and not blank.
    pub fn api_package(&self) -> Option<&str> {
        non_blank(self.api_package.as_deref())
    }

    /// The model package, if set and not blank.
    pub fn model_package(&self) -> Option<&str> {
        non_blank(self.model_package.as_deref())
    }

    /// Whether this document contributes resource/controller code.
    pub fn generates_api(&self) -> bool {
        !self.skip_api && self.api_package().is_some()
    }

    /// Whether this document contributes data-model code.
    pub fn generates_models(&self) -> bool {
        !self.skip_model && self.model_package().is_some()
    }
}

/// Everything one invocation of the generator needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationRun {
    pub specs: Vec<SpecInfo>,
    pub backend: String,
    pub output: PathBuf,
    /// Applied to the backend's property bag before any per-document configuration.
    pub properties: Properties,
    pub enable_builder_support: bool,
    pub exclude_supporting_files: bool,
    pub excluded_models: IndexSet<String>,
    /// Directories scanned for `backend.yaml` manifests.
    pub plugin_dirs: Vec<PathBuf>,
}

impl Default for GenerationRun {
    fn default() -> Self {
        Self {
            specs: Vec::new(),
            backend: DEFAULT_BACKEND.to_string(),
            output: PathBuf::from("target/generated-sources/sdg"),
            properties: Properties::new(),
            enable_builder_support: false,
            exclude_supporting_files: false,
            excluded_models: IndexSet::new(),
            plugin_dirs: Vec::new(),
        }
    }
}

impl GenerationRun {
    pub fn new(backend: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            backend: backend.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn with_spec(mut self, spec: SpecInfo) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_excluded_model(mut self, name: impl Into<String>) -> Self {
        self.excluded_models.insert(name.into());
        self
    }

    pub fn enable_builder_support(mut self, enable: bool) -> Self {
        self.enable_builder_support = enable;
        self
    }

    pub fn exclude_supporting_files(mut self, exclude: bool) -> Self {
        self.exclude_supporting_files = exclude;
        self
    }

    pub fn with_plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugin_dirs.push(dir.into());
        self
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<GenerationRun>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let run: GenerationRun =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Some(run))
}

/// Plugin directories listed in `SDG_BACKEND_PATH`.
pub fn plugin_dirs_from_env() -> Vec<PathBuf> {
    env::var_os(BACKEND_PATH_ENV)
        .map(|paths| env::split_paths(&paths).collect())
        .unwrap_or_default()
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# sdg configuration
backend: custom-spring
output: target/generated-sources/sdg

# enable_builder_support: true     # use builder-style models when the backend supports it
# exclude_supporting_files: true   # skip ApiException / ApiOriginFilter and similar helpers

# properties:                      # backend-specific overrides, applied to every document
#   serializableModel: true

# excluded_models:
#   - InternalError

# plugin_dirs:                     # directories holding <backend>/backend.yaml manifests
#   - ./codegen/backends

specs:
  - source: openapi.yaml
    api_package: com.example.api
    model_package: com.example.model
    # skip_api: false
    # skip_model: false
"#
}
