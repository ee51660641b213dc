//! Render a backend's templates for one document and write the results.

use std::fs;
use std::path::PathBuf;

use heck::{ToLowerCamelCase, ToPascalCase, ToSnakeCase};
use log::{debug, info};
use minijinja::{Environment, context};

use crate::GeneratedFile;
use crate::backend::{Backend, is_confined};
use crate::error::EmissionError;
use crate::ir::OperationGroups;
use crate::parse::DocumentGraph;
use crate::transform::build_document;

/// Turns a configured backend and a filtered graph into files on disk.
pub trait EmissionEngine {
    /// Returns the paths written, in emission order.
    fn emit(&self, backend: &dyn Backend, graph: &DocumentGraph) -> Result<Vec<PathBuf>, EmissionError>;
}

/// Default engine: minijinja templates supplied by the backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEmitter;

impl TemplateEmitter {
    pub fn new() -> Self {
        Self
    }

    /// Render every file for `graph` without touching the filesystem.
    pub fn render(
        &self,
        backend: &dyn Backend,
        graph: &DocumentGraph,
    ) -> Result<Vec<GeneratedFile>, EmissionError> {
        let env = environment(backend)?;
        let document = build_document(graph, backend)?;
        let properties = backend.properties();
        let api_package = backend.api_package();
        let model_package = backend.model_package();
        let mut files = Vec::new();

        if !document.models.is_empty() {
            let folder = backend.model_file_folder()?;
            for model in &document.models {
                for (template, suffix) in backend.model_template_files() {
                    let content = env.get_template(template)?.render(context! {
                        model => model,
                        package => model_package,
                        api_package => api_package,
                        model_package => model_package,
                        info => &document.info,
                        properties => properties,
                    })?;
                    files.push(GeneratedFile {
                        path: folder.join(file_name(backend, &model.classname, suffix)?),
                        content,
                    });
                }
            }
        }

        if document.operations.is_empty() {
            debug!("{}: no operations, API and supporting files skipped", graph.locator());
            return Ok(files);
        }

        let mut groups = OperationGroups::new();
        for (declaring_path, op) in document.operations {
            backend.add_operation_to_group(&mut groups, &declaring_path, op);
        }
        for ops in groups.values_mut() {
            backend.post_process_operations(ops);
        }

        let folder = backend.api_file_folder()?;
        for (group, operations) in &groups {
            let classname = backend.to_api_name(group);
            for (template, suffix) in backend.api_template_files() {
                let content = env.get_template(template)?.render(context! {
                    classname => &classname,
                    group => group,
                    operations => operations,
                    package => api_package,
                    api_package => api_package,
                    model_package => model_package,
                    info => &document.info,
                    properties => properties,
                })?;
                files.push(GeneratedFile {
                    path: folder.join(file_name(backend, &classname, suffix)?),
                    content,
                });
            }
        }

        for supporting in backend.supporting_files()? {
            let relative = supporting.relative_path().ok_or_else(|| EmissionError::EscapingPath {
                backend: backend.name().to_string(),
                path: format!("{}/{}", supporting.folder, supporting.destination),
            })?;
            let content = env.get_template(&supporting.template)?.render(context! {
                package => api_package,
                api_package => api_package,
                model_package => model_package,
                info => &document.info,
                properties => properties,
            })?;
            files.push(GeneratedFile {
                path: backend.output_dir().join(relative),
                content,
            });
        }

        Ok(files)
    }
}

impl EmissionEngine for TemplateEmitter {
    fn emit(&self, backend: &dyn Backend, graph: &DocumentGraph) -> Result<Vec<PathBuf>, EmissionError> {
        let files = self.render(backend, graph)?;
        let written = write_files(&files)?;
        info!("{}: wrote {} files", graph.locator(), written.len());
        Ok(written)
    }
}

/// `<stem><suffix>`, kept inside the folder it is joined to.
fn file_name(backend: &dyn Backend, stem: &str, suffix: &str) -> Result<String, EmissionError> {
    let name = format!("{stem}{suffix}");
    if is_confined(&name) {
        Ok(name)
    } else {
        Err(EmissionError::EscapingPath {
            backend: backend.name().to_string(),
            path: name,
        })
    }
}

/// Register every backend template plus the shared filters.
fn environment(backend: &dyn Backend) -> Result<Environment<'_>, EmissionError> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_keep_trailing_newline(true);
    env.add_filter("pascal_case", |value: String| value.to_pascal_case());
    env.add_filter("camel_case", |value: String| value.to_lower_camel_case());
    env.add_filter("snake_case", |value: String| value.to_snake_case());
    env.add_filter("escape_javadoc", escape_javadoc);

    for (name, source) in backend.templates() {
        env.add_template(name, source)?;
    }

    let referenced = backend
        .api_template_files()
        .keys()
        .chain(backend.model_template_files().keys());
    for name in referenced {
        if env.get_template(name).is_err() {
            return Err(EmissionError::MissingTemplate {
                backend: backend.name().to_string(),
                template: name.clone(),
            });
        }
    }
    Ok(env)
}

/// Keep descriptions from closing a `/** ... */` block early.
fn escape_javadoc(value: String) -> String {
    value.replace("*/", "*&#47;")
}

/// Write files, creating parent directories as needed.
pub fn write_files(files: &[GeneratedFile]) -> Result<Vec<PathBuf>, EmissionError> {
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        if let Some(parent) = file.path.parent() {
            fs::create_dir_all(parent).map_err(|source| EmissionError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&file.path, &file.content).map_err(|source| EmissionError::Io {
            path: file.path.clone(),
            source,
        })?;
        written.push(file.path.clone());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::backend::{BackendManifest, ExtendedBackend, ManifestBackend};
    use crate::error::PackageScope;
    use crate::parse::from_yaml;

    const DOC: &str = r##"
openapi: 3.0.3
info: { title: Shelter, version: "1.0" }
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema: { type: array, items: { $ref: "#/components/schemas/Pet" } }
  /pets/{petId}:
    get:
      operationId: showPet
      parameters:
        - { name: petId, in: path, required: true, schema: { type: string } }
      responses:
        "200": { description: ok }
components:
  schemas:
    Pet:
      type: object
      required: [name]
      properties:
        name: { type: string, description: "Ends a */ comment" }
"##;

    fn backend(extended: bool) -> ManifestBackend {
        let manifest = BackendManifest::from_yaml(&format!(
            r#"
name: text
extended: {extended}
grouping: resource_path
api_templates: {{ api.j2: .txt }}
model_templates: {{ model.j2: .txt }}
supporting_files:
  - {{ template: index.j2, destination: INDEX.txt }}
"#
        ))
        .unwrap();
        let templates = IndexMap::from([
            (
                "api.j2".to_string(),
                "{{ package }}.{{ classname }}\n{% for op in operations %}{{ op.operation_id.original }} {{ op.method }} '{{ op.path }}' '{{ op.mapping_path }}'\n{% endfor %}".to_string(),
            ),
            (
                "model.j2".to_string(),
                "{{ model.classname }}{% for p in model.properties %} {{ p.name.snake_case }}:{{ p.data_type }} {{ p.description | escape_javadoc }}{% endfor %}".to_string(),
            ),
            ("index.j2".to_string(), "{{ info.title }}".to_string()),
        ]);
        let mut backend = ManifestBackend::new(manifest, templates);
        backend.set_output_dir(PathBuf::from("/out"));
        backend
    }

    fn graph() -> DocumentGraph {
        DocumentGraph::new("shelter.yaml", from_yaml(DOC).unwrap())
    }

    #[test]
    fn test_render_models_apis_and_supporting_files() {
        let mut backend = backend(true);
        backend.set_api_package("io.shelter.api");
        backend.set_model_package("io.shelter.model");

        let files = TemplateEmitter.render(&backend, &graph()).unwrap();
        let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(
            paths,
            [
                PathBuf::from("/out/io/shelter/model/Pet.txt"),
                PathBuf::from("/out/io/shelter/api/PetsApi.txt"),
                PathBuf::from("/out/INDEX.txt"),
            ]
        );
        assert_eq!(files[0].content, "Pet name:string Ends a *&#47; comment");
        assert_eq!(
            files[1].content,
            "io.shelter.api.PetsApi\nlistPets GET '' ''\nshowPet GET '' '/{petId}'\n"
        );
        assert_eq!(files[2].content, "Shelter");
    }

    #[test]
    fn test_missing_api_package_fails_only_when_api_is_emitted() {
        let backend = backend(false);
        let err = TemplateEmitter.render(&backend, &graph()).unwrap_err();
        assert!(matches!(
            err,
            EmissionError::MissingPackage(ref missing) if missing.scope == PackageScope::Model
        ));

        let mut graph = graph();
        graph.clear_definitions();
        let err = TemplateEmitter.render(&backend, &graph).unwrap_err();
        assert!(matches!(
            err,
            EmissionError::MissingPackage(ref missing) if missing.scope == PackageScope::Api
        ));

        graph.clear_paths();
        assert!(TemplateEmitter.render(&backend, &graph).unwrap().is_empty());
    }

    #[test]
    fn test_unregistered_template_is_reported() {
        let manifest = BackendManifest::from_yaml("name: bad\napi_templates: { nope.j2: .txt }").unwrap();
        let backend = ManifestBackend::new(manifest, IndexMap::new());
        let err = TemplateEmitter.render(&backend, &graph()).unwrap_err();
        assert!(matches!(err, EmissionError::MissingTemplate { template, .. } if template == "nope.j2"));
    }

    #[test]
    fn test_files_outside_the_output_dir_are_refused() {
        let templates = IndexMap::from([
            ("index.j2".to_string(), "{{ info.title }}".to_string()),
            ("model.j2".to_string(), "{{ model.classname }}".to_string()),
        ]);
        let escaping = BackendManifest::from_yaml(
            "name: sneaky\nsupporting_files:\n  - { template: index.j2, folder: ../etc, destination: hosts }\n",
        )
        .unwrap();
        let mut backend = ManifestBackend::new(escaping, templates.clone());
        backend.set_output_dir(PathBuf::from("/out"));
        let mut api_only = graph();
        api_only.clear_definitions();
        backend.state_mut().api_package = Some("io.shelter.api".to_string());

        let err = TemplateEmitter.render(&backend, &api_only).unwrap_err();
        assert!(matches!(
            err,
            EmissionError::EscapingPath { ref path, .. } if path == "../etc/hosts"
        ));

        let climbing_suffix =
            BackendManifest::from_yaml("name: sneaky\nmodel_templates: { model.j2: /../../Pet.txt }\n").unwrap();
        let mut backend = ManifestBackend::new(climbing_suffix, templates);
        backend.state_mut().model_package = Some("io.shelter.model".to_string());
        let err = TemplateEmitter.render(&backend, &graph()).unwrap_err();
        assert!(matches!(err, EmissionError::EscapingPath { .. }));
    }

    #[test]
    fn test_write_files_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![GeneratedFile {
            path: dir.path().join("a/b/C.java"),
            content: "class C {}".into(),
        }];
        let written = write_files(&files).unwrap();
        assert_eq!(written, [dir.path().join("a/b/C.java")]);
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "class C {}");
    }
}
