pub mod backend;
pub mod config;
pub mod emit;
pub mod error;
pub mod generator;
pub mod ir;
pub mod package;
pub mod parse;
pub mod transform;

use std::path::PathBuf;

pub use backend::registry::{BackendLoader, BackendProvider, BackendRegistry};
pub use backend::{Backend, BackendKind, ExtendedBackend, ManifestBackend, ManifestLoader};
pub use config::{GenerationRun, SpecInfo};
pub use emit::{EmissionEngine, TemplateEmitter};
pub use error::GenerationError;
pub use generator::{GenerationReport, SpecDrivenGenerator};
pub use parse::{DocumentGraph, OpenApiParser, SpecParser};
pub use transform::ResponseNormalizer;

/// A rendered file and the absolute location it will be written to.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}
