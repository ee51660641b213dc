use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info, warn};

use super::Backend;
use super::manifest::{MANIFEST_FILE_NAME, ManifestBackend};
use crate::error::{BackendLoadError, GenerationError, report};

/// A statically linked backend factory.
pub trait BackendProvider {
    /// Name of the backend this provider creates.
    fn name(&self) -> &str;

    fn create(&self) -> Box<dyn Backend>;
}

/// Instantiates a backend from an implementation identifier not known to the registry.
pub trait BackendLoader {
    fn load(&self, identifier: &str) -> Result<Box<dyn Backend>, BackendLoadError>;
}

/// Named backend instances for one run.
pub struct BackendRegistry {
    backends: IndexMap<String, Box<dyn Backend>>,
    loader: Arc<dyn BackendLoader>,
}

impl BackendRegistry {
    /// An empty registry falling back to `loader`.
    pub fn new(loader: Arc<dyn BackendLoader>) -> Self {
        Self {
            backends: IndexMap::new(),
            loader,
        }
    }

    /// Instantiate every provider, then every manifest backend under `plugin_dirs`.
    pub fn discover(
        providers: &[Arc<dyn BackendProvider>],
        plugin_dirs: &[PathBuf],
        loader: Arc<dyn BackendLoader>,
    ) -> Self {
        let mut registry = Self::new(loader);
        for provider in providers {
            registry.register(provider.create());
        }
        for dir in plugin_dirs {
            registry.scan_plugin_dir(dir);
        }
        debug!(
            "discovered backends: {}",
            registry.names().collect::<Vec<_>>().join(", ")
        );
        registry
    }

    fn scan_plugin_dir(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("skipping plugin directory {}: {e}", dir.display());
                return;
            }
        };
        let mut candidates: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.join(MANIFEST_FILE_NAME).is_file())
            .collect();
        // read_dir order is platform-dependent
        candidates.sort();

        for candidate in candidates {
            match ManifestBackend::load(&candidate) {
                Ok(backend) => self.register(Box::new(backend)),
                Err(e) => warn!("skipping backend at {}: {}", candidate.display(), report(&e)),
            }
        }
    }

    /// Add a backend under its declared name. A later backend replaces an earlier one.
    pub fn register(&mut self, backend: Box<dyn Backend>) {
        let name = backend.name().to_string();
        if self.backends.insert(name.clone(), backend).is_some() {
            warn!("backend '{name}' registered more than once, keeping the last one");
        }
    }

    /// Resolve by declared name, else load `name` as an implementation identifier.
    ///
    /// Loaded backends are cached under the identifier, so repeated resolution
    /// returns the same instance.
    pub fn resolve(&mut self, name: &str) -> Result<&mut dyn Backend, GenerationError> {
        if !self.backends.contains_key(name) {
            let backend = self
                .loader
                .load(name)
                .map_err(|cause| GenerationError::UnknownBackend {
                    name: name.to_string(),
                    cause: Some(cause),
                })?;
            info!("loaded backend '{}' from {name}", backend.name());
            self.backends.insert(name.to_string(), backend);
        }
        match self.backends.get_mut(name) {
            Some(backend) => Ok(&mut **backend as &mut dyn Backend),
            None => Err(GenerationError::UnknownBackend {
                name: name.to_string(),
                cause: None,
            }),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Backend> {
        self.backends.values().map(|backend| &**backend as &dyn Backend)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendManifest, ManifestLoader};

    struct StaticProvider(&'static str);

    impl BackendProvider for StaticProvider {
        fn name(&self) -> &str {
            self.0
        }

        fn create(&self) -> Box<dyn Backend> {
            let manifest = BackendManifest::from_yaml(&format!("name: {}", self.0)).unwrap();
            Box::new(ManifestBackend::new(manifest, IndexMap::new()))
        }
    }

    fn providers(names: &[&'static str]) -> Vec<Arc<dyn BackendProvider>> {
        names
            .iter()
            .map(|name| Arc::new(StaticProvider(*name)) as Arc<dyn BackendProvider>)
            .collect()
    }

    fn write_manifest(dir: &Path, yaml: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE_NAME), yaml).unwrap();
    }

    #[test]
    fn test_resolve_returns_same_instance() {
        let mut registry =
            BackendRegistry::discover(&providers(&["custom-spring"]), &[], Arc::new(ManifestLoader));

        registry
            .resolve("custom-spring")
            .unwrap()
            .properties_mut()
            .insert("marker".into(), serde_json::json!(1));

        let again = registry.resolve("custom-spring").unwrap();
        assert_eq!(again.properties()["marker"], 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_fresh_registry_per_run() {
        let providers = providers(&["custom-spring"]);
        let mut first = BackendRegistry::discover(&providers, &[], Arc::new(ManifestLoader));
        first
            .resolve("custom-spring")
            .unwrap()
            .properties_mut()
            .insert("marker".into(), serde_json::json!(1));

        let mut second = BackendRegistry::discover(&providers, &[], Arc::new(ManifestLoader));
        assert!(second.resolve("custom-spring").unwrap().properties().is_empty());
    }

    #[test]
    fn test_unknown_backend_chains_loader_error() {
        let mut registry = BackendRegistry::discover(&providers(&["a"]), &[], Arc::new(ManifestLoader));
        // Lookup is case-sensitive.
        let err = registry.resolve("A").err().unwrap();
        match err {
            GenerationError::UnknownBackend { name, cause } => {
                assert_eq!(name, "A");
                assert!(matches!(cause, Some(BackendLoadError::NotFound(_))));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dynamic_load_by_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let backend_dir = dir.path().join("docs");
        write_manifest(&backend_dir, "name: docs\nkind: documentation\n");

        let mut registry = BackendRegistry::discover(&[], &[], Arc::new(ManifestLoader));
        let identifier = backend_dir.to_str().unwrap();
        assert_eq!(registry.resolve(identifier).unwrap().name(), "docs");
        assert!(registry.contains(identifier));
        assert!(!registry.contains("docs"));
    }

    #[test]
    fn test_plugin_dir_discovery() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(&dir.path().join("a-docs"), "name: docs\nhelp: first\n");
        write_manifest(&dir.path().join("b-docs"), "name: docs\nhelp: second\n");
        write_manifest(&dir.path().join("broken"), "name: [unterminated\n");
        fs::create_dir_all(dir.path().join("not-a-backend")).unwrap();

        let plugin_dirs = vec![dir.path().to_path_buf(), dir.path().join("missing")];
        let mut registry =
            BackendRegistry::discover(&providers(&["custom-spring"]), &plugin_dirs, Arc::new(ManifestLoader));

        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, ["custom-spring", "docs"]);
        assert_eq!(registry.resolve("docs").unwrap().help(), "second");
    }
}
