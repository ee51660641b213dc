use indexmap::IndexMap;
use log::debug;
use sdg_core::Backend;
use sdg_core::backend::{BackendKind, BackendState, ExtendedBackend, SupportingFile, TemplateFiles};
use sdg_core::error::{MissingPackageError, PackageScope};
use sdg_core::ir::grouping::add_operation_to_group;
use sdg_core::ir::{IrOperation, IrType, OperationGroups};
use sdg_core::package::{package_to_path, require};
use sdg_core::transform::ResponseNormalizer;
use sdg_core::transform::name_normalizer::class_name;

use crate::BACKEND_NAME;
use crate::type_mapper::ir_type_to_java;

/// Generic type every controller method returns.
pub const RESPONSE_ENVELOPE: &str = "ResponseEntity";

const CONTROLLER_SUFFIX: &str = "RestController";

const API_TEMPLATE: &str = "api.java.j2";
const MODEL_TEMPLATE: &str = "model.java.j2";
const BUILDER_MODEL_TEMPLATE: &str = "model_builder.java.j2";

const TEMPLATES: [(&str, &str); 5] = [
    (API_TEMPLATE, include_str!("../templates/api.java.j2")),
    (MODEL_TEMPLATE, include_str!("../templates/model.java.j2")),
    (
        BUILDER_MODEL_TEMPLATE,
        include_str!("../templates/model_builder.java.j2"),
    ),
    (
        "ApiException.java.j2",
        include_str!("../templates/ApiException.java.j2"),
    ),
    (
        "ApiOriginFilter.java.j2",
        include_str!("../templates/ApiOriginFilter.java.j2"),
    ),
];

fn java_templates(template: &str) -> TemplateFiles {
    IndexMap::from([(template.to_string(), ".java".to_string())])
}

/// Spring REST controller interfaces plus Jackson models.
///
/// Operations are grouped by the first segment of their declaring path and
/// every handler returns [`RESPONSE_ENVELOPE`].
pub struct SpringServerBackend {
    state: BackendState,
    api_templates: TemplateFiles,
    model_templates: TemplateFiles,
    exclude_supporting_files: bool,
    normalizer: ResponseNormalizer,
}

impl SpringServerBackend {
    pub fn new() -> Self {
        Self {
            state: BackendState::default(),
            api_templates: java_templates(API_TEMPLATE),
            model_templates: java_templates(MODEL_TEMPLATE),
            exclude_supporting_files: false,
            normalizer: ResponseNormalizer::new(RESPONSE_ENVELOPE),
        }
    }

    pub fn builder_enabled(&self) -> bool {
        self.model_templates.contains_key(BUILDER_MODEL_TEMPLATE)
    }
}

impl Default for SpringServerBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for SpringServerBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn help(&self) -> &str {
        "Generates Spring REST controller interfaces and Jackson models."
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Server
    }

    fn state(&self) -> &BackendState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut BackendState {
        &mut self.state
    }

    fn api_template_files(&self) -> &TemplateFiles {
        &self.api_templates
    }

    fn model_template_files(&self) -> &TemplateFiles {
        &self.model_templates
    }

    /// `ApiException` and `ApiOriginFilter`, next to the controllers.
    fn supporting_files(&self) -> Result<Vec<SupportingFile>, MissingPackageError> {
        if self.exclude_supporting_files {
            return Ok(Vec::new());
        }
        let package = require(PackageScope::Api, self.api_package())?;
        let folder = package_to_path(package).to_string_lossy().into_owned();
        Ok(vec![
            SupportingFile::new("ApiException.java.j2", folder.clone(), "ApiException.java"),
            SupportingFile::new("ApiOriginFilter.java.j2", folder, "ApiOriginFilter.java"),
        ])
    }

    fn templates(&self) -> Vec<(&str, &str)> {
        TEMPLATES.to_vec()
    }

    fn type_declaration(&self, ty: &IrType) -> String {
        ir_type_to_java(ty)
    }

    fn to_api_name(&self, group: &str) -> String {
        class_name(group, CONTROLLER_SUFFIX)
    }

    fn add_operation_to_group(
        &self,
        groups: &mut OperationGroups,
        declaring_path: &str,
        op: IrOperation,
    ) {
        add_operation_to_group(groups, declaring_path, op);
    }

    fn post_process_operations(&self, ops: &mut [IrOperation]) {
        self.normalizer.normalize_all(ops.iter_mut());
    }

    fn extended(&mut self) -> Option<&mut dyn ExtendedBackend> {
        Some(self)
    }
}

impl ExtendedBackend for SpringServerBackend {
    fn set_api_package(&mut self, package: &str) {
        self.state.api_package = Some(package.to_string());
    }

    fn set_model_package(&mut self, package: &str) {
        self.state.model_package = Some(package.to_string());
    }

    fn is_builder_supported(&self) -> bool {
        true
    }

    fn enable_builder_support(&mut self) {
        debug!("{BACKEND_NAME}: models rendered with builders");
        self.model_templates = java_templates(BUILDER_MODEL_TEMPLATE);
    }

    fn exclude_supporting_files(&mut self) {
        self.exclude_supporting_files = true;
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use sdg_core::ir::{Container, HttpMethod};
    use sdg_core::transform::responses::{CONSUMES_EXPECTED, MULTIPLE_RESPONSE_TYPES};

    use super::*;

    #[test]
    fn test_controller_names() {
        let backend = SpringServerBackend::new();
        assert_eq!(backend.to_api_name("pets"), "PetsRestController");
        assert_eq!(backend.to_api_name("pet-photos"), "PetPhotosRestController");
        assert_eq!(backend.to_api_name(""), "DefaultRestController");
    }

    #[test]
    fn test_supporting_files_follow_api_package() {
        let mut backend = SpringServerBackend::new();
        assert_eq!(
            backend.supporting_files().unwrap_err().scope,
            PackageScope::Api
        );

        backend.set_api_package("io.pets.api");
        let files = backend.supporting_files().unwrap();
        let destinations: Vec<PathBuf> = files
            .iter()
            .map(|f| PathBuf::from(&f.folder).join(&f.destination))
            .collect();
        assert_eq!(
            destinations,
            [
                PathBuf::from("io/pets/api/ApiException.java"),
                PathBuf::from("io/pets/api/ApiOriginFilter.java"),
            ]
        );

        backend.exclude_supporting_files();
        assert!(backend.supporting_files().unwrap().is_empty());
    }

    #[test]
    fn test_builder_support_swaps_model_template() {
        let mut backend = SpringServerBackend::new();
        assert!(!backend.builder_enabled());
        let extended = backend.extended().unwrap();
        assert!(extended.is_builder_supported());
        extended.enable_builder_support();
        assert!(backend.builder_enabled());
        assert_eq!(
            backend.model_template_files().keys().collect::<Vec<_>>(),
            ["model_builder.java.j2"]
        );
    }

    #[test]
    fn test_every_referenced_template_is_shipped() {
        let mut backend = SpringServerBackend::new();
        backend.set_api_package("io.pets.api");
        for name in backend
            .api_template_files()
            .keys()
            .chain(backend.model_template_files().keys())
        {
            assert!(backend.template_source(name).is_some(), "{name}");
        }
        for file in backend.supporting_files().unwrap() {
            assert!(backend.template_source(&file.template).is_some());
        }
        assert!(backend.template_source(BUILDER_MODEL_TEMPLATE).is_some());
    }

    #[test]
    fn test_grouping_and_normalization() {
        let backend = SpringServerBackend::new();
        let mut groups = OperationGroups::new();
        let ops = [
            IrOperation::new(HttpMethod::Get, "/pets/{id}")
                .with_response("200", Some("Pet"))
                .with_response("404", Some("Error")),
            IrOperation::new(HttpMethod::Post, "/pets/{id}/photos").with_response("0", None),
        ];
        for op in ops {
            backend.add_operation_to_group(&mut groups, "/pets", op);
        }
        for ops in groups.values_mut() {
            backend.post_process_operations(ops);
        }

        assert_eq!(groups.keys().collect::<Vec<_>>(), ["pets"]);
        let ops = &groups["pets"];
        assert_eq!(ops[0].path, "");
        assert!(!ops[0].is_sub_resource);
        assert_eq!(ops[1].path, "/photos");
        assert!(ops[1].is_sub_resource);
        assert_eq!(ops[0].mapping_path, "/{id}");
        assert_eq!(ops[1].mapping_path, "/{id}/photos");

        for op in ops {
            assert_eq!(op.return_type.as_deref(), Some(RESPONSE_ENVELOPE));
        }
        assert_eq!(ops[0].vendor_extensions[MULTIPLE_RESPONSE_TYPES], true);
        assert_eq!(ops[0].vendor_extensions[CONSUMES_EXPECTED], false);
        assert_eq!(ops[1].vendor_extensions[CONSUMES_EXPECTED], true);
        assert_eq!(ops[1].responses[0].code, "500");
        assert_eq!(ops[0].return_container, None::<Container>);
    }

    #[test]
    fn test_java_type_declarations() {
        let backend = SpringServerBackend::new();
        assert_eq!(
            backend.type_declaration(&IrType::Array(Box::new(IrType::Ref("pet".into())))),
            "List<Pet>"
        );
        assert_eq!(backend.type_declaration(&IrType::DateTime), "OffsetDateTime");
    }
}
