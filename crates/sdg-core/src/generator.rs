//! Drive one generation run across every configured document.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use crate::backend::registry::{BackendLoader, BackendProvider, BackendRegistry};
use crate::backend::{Backend, ManifestLoader};
use crate::config::{GenerationRun, SpecInfo, plugin_dirs_from_env};
use crate::emit::{EmissionEngine, TemplateEmitter};
use crate::error::GenerationError;
use crate::package;
use crate::parse::source::check_reachable;
use crate::parse::{OpenApiParser, SpecParser};

/// What a successful run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub output_root: PathBuf,
    pub files: Vec<PathBuf>,
}

impl GenerationReport {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// The document, if any, that generates the run's API code.
#[derive(Debug, Default)]
struct ApiSurface(Option<String>);

impl ApiSurface {
    fn claim(&mut self, locator: &str) -> Result<(), GenerationError> {
        match &self.0 {
            Some(first) => Err(GenerationError::MultipleApiSurfaces {
                first: first.clone(),
                second: locator.to_string(),
            }),
            None => {
                self.0 = Some(locator.to_string());
                Ok(())
            }
        }
    }
}

/// Loads documents, applies per-document policy and hands them to the emission engine.
pub struct SpecDrivenGenerator {
    providers: Vec<Arc<dyn BackendProvider>>,
    parser: Box<dyn SpecParser>,
    emitter: Box<dyn EmissionEngine>,
    loader: Arc<dyn BackendLoader>,
}

impl SpecDrivenGenerator {
    /// A generator with the default parser, emitter and manifest loader.
    pub fn new(providers: Vec<Arc<dyn BackendProvider>>) -> Self {
        Self {
            providers,
            parser: Box::new(OpenApiParser::new()),
            emitter: Box::new(TemplateEmitter::new()),
            loader: Arc::new(ManifestLoader),
        }
    }

    pub fn with_parser(mut self, parser: impl SpecParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn with_emitter(mut self, emitter: impl EmissionEngine + 'static) -> Self {
        self.emitter = Box::new(emitter);
        self
    }

    pub fn with_loader(mut self, loader: impl BackendLoader + 'static) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    /// A fresh registry for `run`: providers, then the run's and `SDG_BACKEND_PATH`'s plugin dirs.
    pub fn registry(&self, run: &GenerationRun) -> BackendRegistry {
        let mut plugin_dirs = run.plugin_dirs.clone();
        plugin_dirs.extend(plugin_dirs_from_env());
        BackendRegistry::discover(&self.providers, &plugin_dirs, Arc::clone(&self.loader))
    }

    /// Apply package defaults and check every document before anything is emitted.
    pub fn validate(&self, run: &mut GenerationRun) -> Result<(), GenerationError> {
        let mut surface = ApiSurface::default();
        for spec in &mut run.specs {
            package::apply_defaults(spec);
            package::validate(spec)?;
            check_reachable(&spec.source)?;
            if spec.generates_api() {
                surface.claim(&spec.source)?;
            }
        }
        Ok(())
    }

    /// Run the whole pipeline. Any failure aborts the run.
    pub fn generate(&self, mut run: GenerationRun) -> Result<GenerationReport, GenerationError> {
        self.validate(&mut run)?;

        fs::create_dir_all(&run.output).map_err(|source| GenerationError::Io {
            path: run.output.clone(),
            source,
        })?;

        let mut registry = self.registry(&run);
        let mut surface = ApiSurface::default();
        let mut report = GenerationReport {
            output_root: run.output.clone(),
            files: Vec::new(),
        };
        for spec in &run.specs {
            let files = self.generate_document(&mut registry, &run, spec, &mut surface)?;
            report.files.extend(files);
        }
        info!(
            "generated {} files into {}",
            report.file_count(),
            report.output_root.display()
        );
        Ok(report)
    }

    fn generate_document(
        &self,
        registry: &mut BackendRegistry,
        run: &GenerationRun,
        spec: &SpecInfo,
        surface: &mut ApiSurface,
    ) -> Result<Vec<PathBuf>, GenerationError> {
        info!("processing {} with backend {}", spec.source, run.backend);
        let backend = registry.resolve(&run.backend)?;

        for (key, value) in &run.properties {
            backend.properties_mut().insert(key.clone(), value.clone());
        }
        configure(backend, run, spec);
        backend.set_output_dir(run.output.clone());

        let mut graph = self
            .parser
            .parse(&spec.source)
            .map_err(|source| GenerationError::Parse {
                locator: spec.source.clone(),
                source,
            })?;

        if spec.generates_api() {
            surface.claim(&spec.source)?;
        } else {
            info!("API generation disabled for {}", spec.source);
            graph.clear_paths();
        }

        if spec.generates_models() {
            for name in &run.excluded_models {
                if graph.remove_definition(name) {
                    info!("model {name} excluded from {}", spec.source);
                }
            }
        } else {
            info!("model generation disabled for {}", spec.source);
            graph.clear_definitions();
        }

        self.emitter
            .emit(backend, &graph)
            .map_err(|e| GenerationError::from_emission(&spec.source, e))
    }
}

/// Push per-document settings into a backend that accepts them.
fn configure(backend: &mut dyn Backend, run: &GenerationRun, spec: &SpecInfo) {
    let name = backend.name().to_string();
    let Some(extended) = backend.extended() else {
        if run.enable_builder_support || run.exclude_supporting_files {
            warn!("backend {name} does not accept package, builder or supporting-file settings");
        }
        return;
    };

    if let Some(package) = spec.api_package() {
        extended.set_api_package(package);
    }
    if let Some(package) = spec.model_package() {
        extended.set_model_package(package);
    }
    if run.enable_builder_support {
        if extended.is_builder_supported() {
            info!("builder support enabled for {name}");
            extended.enable_builder_support();
        } else {
            info!("builder support requested but not supported by {name}");
        }
    }
    if run.exclude_supporting_files {
        extended.exclude_supporting_files();
    }
}
