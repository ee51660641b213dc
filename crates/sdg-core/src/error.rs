use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which generation scope a package name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageScope {
    /// Resource/controller code.
    Api,
    /// Data-model code.
    Model,
}

impl fmt::Display for PackageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageScope::Api => write!(f, "apiPackage"),
            PackageScope::Model => write!(f, "modelPackage"),
        }
    }
}

#[derive(Debug, Error)]
#[error("'{scope}' should not be null or empty")]
pub struct MissingPackageError {
    pub scope: PackageScope,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} when fetching {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("failed to parse YAML")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),

    #[error("unsupported source scheme: {0}")]
    UnsupportedScheme(String),
}

#[derive(Debug, Error)]
pub enum EmissionError {
    #[error(transparent)]
    MissingPackage(#[from] MissingPackageError),

    #[error("backend {backend} has no template named {template}")]
    MissingTemplate { backend: String, template: String },

    #[error("template error")]
    Template(#[from] minijinja::Error),

    #[error("unresolved reference: {0}")]
    UnresolvedRef(String),

    #[error("backend {backend} would write '{path}' outside the output directory")]
    EscapingPath { backend: String, path: String },

    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum BackendLoadError {
    #[error("no backend manifest found at {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid backend manifest {path}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("backend manifest {manifest} references missing template {template}")]
    MissingTemplate { manifest: PathBuf, template: String },

    #[error("backend manifest {manifest} refers to '{path}' outside its directory")]
    EscapingPath { manifest: PathBuf, path: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
}

/// Every way a generation run can fail. A failure for one document aborts the run.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("specification source not found: {locator}")]
    SourceNotFound { locator: String },

    #[error("no codegen available for the given name: {name}")]
    UnknownBackend {
        name: String,
        #[source]
        cause: Option<BackendLoadError>,
    },

    #[error(transparent)]
    MissingPackage(#[from] MissingPackageError),

    #[error("invalid package name '{package}' for {locator}")]
    InvalidPackage { locator: String, package: String },

    #[error("{locator} generates neither API nor model code")]
    NothingToGenerate { locator: String },

    #[error("multiple API definitions not allowed: {first} already generates the API, {second} cannot")]
    MultipleApiSurfaces { first: String, second: String },

    #[error("failed to parse {locator}")]
    Parse {
        locator: String,
        #[source]
        source: ParseError,
    },

    #[error("failed to generate code for {locator}")]
    Emission {
        locator: String,
        #[source]
        source: EmissionError,
    },

    #[error("failed to create output directory {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GenerationError {
    /// Wrap an emission failure, lifting a missing package to the top-level variant.
    pub fn from_emission(locator: &str, error: EmissionError) -> Self {
        match error {
            EmissionError::MissingPackage(missing) => GenerationError::MissingPackage(missing),
            source => GenerationError::Emission {
                locator: locator.to_string(),
                source,
            },
        }
    }
}

/// One line holding an error and every cause below it, `: `-separated.
pub fn report(error: &dyn StdError) -> String {
    let mut line = error.to_string();
    let mut cause = error.source();
    while let Some(inner) = cause {
        line.push_str(": ");
        line.push_str(&inner.to_string());
        cause = inner.source();
    }
    line
}
