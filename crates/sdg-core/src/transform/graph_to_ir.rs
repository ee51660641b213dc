use indexmap::{IndexMap, IndexSet};
use log::debug;
use openapiv3::{
    Components, MediaType, ObjectType, Operation, Parameter, ParameterSchemaOrContent,
    ReferenceOr, RequestBody, Schema, SchemaKind, StatusCode, Type,
};

use crate::backend::Backend;
use crate::error::EmissionError;
use crate::ir::*;
use crate::parse::DocumentGraph;
use crate::parse::graph::path_operations;

use super::name_normalizer::normalize_name;
use super::responses::DEFAULT_RESPONSE_CODE;
use super::schema_resolver::{ref_name, schema_or_ref_to_ir_type};

/// Indirections followed before a `$ref` chain is reported unresolved.
const MAX_REF_DEPTH: usize = 16;

/// Convert a graph into operations and models typed for `backend`.
pub fn build_document(
    graph: &DocumentGraph,
    backend: &dyn Backend,
) -> Result<IrDocument, EmissionError> {
    let spec = graph.spec();
    let builder = IrBuilder {
        components: spec.components.as_ref(),
        backend,
    };

    let info = IrInfo {
        title: spec.info.title.clone(),
        description: spec.info.description.clone(),
        version: spec.info.version.clone(),
    };

    let mut operations = Vec::new();
    for (path, item) in &spec.paths.paths {
        let item = match item {
            ReferenceOr::Item(item) => item,
            ReferenceOr::Reference { reference } => {
                debug!("{path}: path item reference {reference} skipped");
                continue;
            }
        };
        let shared = builder.parameters(&item.parameters)?;
        for (method, op) in path_operations(item) {
            operations.push((path.clone(), builder.operation(method, path, op, &shared)?));
        }
    }

    let mut models = Vec::new();
    if let Some(components) = builder.components {
        for (name, schema) in &components.schemas {
            match schema {
                ReferenceOr::Item(schema) => {
                    if let Some(model) = builder.model(name, schema) {
                        models.push(model);
                    } else {
                        debug!("{name}: not a model definition, skipped");
                    }
                }
                ReferenceOr::Reference { reference } => {
                    debug!("{name}: alias of {reference}, skipped");
                }
            }
        }
    }

    Ok(IrDocument {
        info,
        models,
        operations,
    })
}

struct IrBuilder<'a> {
    components: Option<&'a Components>,
    backend: &'a dyn Backend,
}

impl<'a> IrBuilder<'a> {
    fn operation(
        &self,
        method: HttpMethod,
        path: &str,
        op: &'a Operation,
        shared: &[IrParameter],
    ) -> Result<IrOperation, EmissionError> {
        let mut ir = IrOperation::new(method, path);
        if let Some(id) = op.operation_id.as_deref().filter(|id| !id.trim().is_empty()) {
            ir.operation_id = normalize_name(id);
        }
        ir.summary = op.summary.clone();
        ir.description = op.description.clone();
        ir.tags = op.tags.clone();
        ir.deprecated = op.deprecated;
        ir.vendor_extensions = op.extensions.clone();

        // Operation-level parameters override path-level ones with the same name and location.
        let own = self.parameters(&op.parameters)?;
        let mut parameters: Vec<IrParameter> = shared
            .iter()
            .filter(|p| {
                !own.iter()
                    .any(|o| o.base_name == p.base_name && o.location == p.location)
            })
            .cloned()
            .collect();
        parameters.extend(own);
        ir.parameters = parameters;

        if let Some(body) = &op.request_body {
            let body = self.resolve(body, |c| &c.request_bodies)?;
            ir.consumes = body.content.keys().cloned().collect();
            ir.body_param = self.body_parameter(body);
        }

        let mut produces = IndexSet::new();
        let declared = op
            .responses
            .responses
            .iter()
            .map(|(code, r)| (status_code(code), r))
            .chain(
                op.responses
                    .default
                    .iter()
                    .map(|r| (DEFAULT_RESPONSE_CODE.to_string(), r)),
            );
        for (code, response) in declared {
            let response = self.resolve(response, |c| &c.responses)?;
            produces.extend(response.content.keys().cloned());
            let ty = preferred_media(&response.content)
                .and_then(|media| media.schema.as_ref())
                .map(schema_or_ref_to_ir_type);
            ir.responses.push(IrResponse {
                code,
                message: response.description.clone(),
                data_type: ty.as_ref().map(|t| self.backend.type_declaration(t)),
                container: ty.as_ref().and_then(IrType::container),
            });
            if ir.return_type.is_none() && ir.responses.last().is_some_and(is_success) {
                if let Some(ty) = &ty {
                    ir.return_type = Some(self.backend.type_declaration(ty));
                    ir.return_base_type = Some(self.backend.type_declaration(ty.base()));
                    ir.return_container = ty.container();
                }
            }
        }
        ir.produces = produces.into_iter().collect();

        Ok(ir)
    }

    fn parameters(
        &self,
        params: &'a [ReferenceOr<Parameter>],
    ) -> Result<Vec<IrParameter>, EmissionError> {
        let mut resolved = Vec::with_capacity(params.len());
        for p in params {
            let param = self.resolve(p, |c| &c.parameters)?;
            resolved.push(self.parameter(param));
        }
        Ok(resolved)
    }

    fn parameter(&self, param: &Parameter) -> IrParameter {
        let (data, location) = match param {
            Parameter::Query { parameter_data, .. } => (parameter_data, IrParameterLocation::Query),
            Parameter::Header { parameter_data, .. } => {
                (parameter_data, IrParameterLocation::Header)
            }
            Parameter::Path { parameter_data, .. } => (parameter_data, IrParameterLocation::Path),
            Parameter::Cookie { parameter_data, .. } => {
                (parameter_data, IrParameterLocation::Cookie)
            }
        };
        let ty = match &data.format {
            ParameterSchemaOrContent::Schema(schema) => schema_or_ref_to_ir_type(schema),
            ParameterSchemaOrContent::Content(content) => preferred_media(content)
                .and_then(|media| media.schema.as_ref())
                .map(schema_or_ref_to_ir_type)
                .unwrap_or(IrType::String),
        };
        IrParameter {
            name: normalize_name(&data.name),
            base_name: data.name.clone(),
            location,
            data_type: self.backend.type_declaration(&ty),
            // Path parameters are always required
            required: data.required || location == IrParameterLocation::Path,
            description: data.description.clone(),
        }
    }

    fn body_parameter(&self, body: &RequestBody) -> Option<IrBodyParameter> {
        let (content_type, media) = body
            .content
            .get_key_value("application/json")
            .or_else(|| body.content.first())?;
        let ty = media
            .schema
            .as_ref()
            .map(schema_or_ref_to_ir_type)
            .unwrap_or(IrType::Any);
        Some(IrBodyParameter {
            data_type: self.backend.type_declaration(&ty),
            required: body.required,
            description: body.description.clone(),
            content_type: content_type.clone(),
        })
    }

    fn model(&self, name: &str, schema: &Schema) -> Option<IrModel> {
        let mut model = IrModel {
            name: name.to_string(),
            classname: self.backend.to_model_name(name),
            description: schema.schema_data.description.clone(),
            parent: None,
            properties: Vec::new(),
            enum_values: Vec::new(),
        };

        match &schema.schema_kind {
            SchemaKind::Type(Type::String(s)) if !s.enumeration.is_empty() => {
                model.enum_values = s.enumeration.iter().flatten().cloned().collect();
            }
            SchemaKind::Type(Type::Object(object)) => {
                model.properties = self.properties(object);
            }
            SchemaKind::AllOf { all_of } => {
                let parents: Vec<&str> = all_of
                    .iter()
                    .filter_map(|member| match member {
                        ReferenceOr::Reference { reference } => Some(ref_name(reference)),
                        ReferenceOr::Item(_) => None,
                    })
                    .collect();
                if let [parent] = parents.as_slice() {
                    model.parent = Some(self.backend.to_model_name(parent));
                }
                for member in all_of {
                    if let ReferenceOr::Item(Schema {
                        schema_kind: SchemaKind::Type(Type::Object(object)),
                        ..
                    }) = member
                    {
                        model.properties.extend(self.properties(object));
                    }
                }
            }
            SchemaKind::Any(any) if !any.properties.is_empty() => {
                let object = ObjectType {
                    properties: any.properties.clone(),
                    required: any.required.clone(),
                    ..ObjectType::default()
                };
                model.properties = self.properties(&object);
            }
            _ => return None,
        }
        Some(model)
    }

    fn properties(&self, object: &ObjectType) -> Vec<IrProperty> {
        object
            .properties
            .iter()
            .map(|(name, prop)| {
                let ty = schema_or_ref_to_ir_type(prop);
                let (read_only, description) = match prop {
                    ReferenceOr::Item(schema) => (
                        schema.schema_data.read_only,
                        schema.schema_data.description.clone(),
                    ),
                    ReferenceOr::Reference { .. } => (false, None),
                };
                IrProperty {
                    name: normalize_name(name),
                    base_name: name.clone(),
                    data_type: self.backend.type_declaration(&ty),
                    base_type: self.backend.type_declaration(ty.base()),
                    container: ty.container(),
                    required: object.required.contains(name),
                    read_only,
                    description,
                }
            })
            .collect()
    }

    /// Follow a `$ref` into the component table chosen by `table`.
    fn resolve<T>(
        &self,
        item: &'a ReferenceOr<T>,
        table: fn(&'a Components) -> &'a IndexMap<String, ReferenceOr<T>>,
    ) -> Result<&'a T, EmissionError> {
        let mut current = item;
        for _ in 0..MAX_REF_DEPTH {
            match current {
                ReferenceOr::Item(value) => return Ok(value),
                ReferenceOr::Reference { reference } => {
                    current = self
                        .components
                        .map(table)
                        .and_then(|entries| entries.get(ref_name(reference)))
                        .ok_or_else(|| EmissionError::UnresolvedRef(reference.clone()))?;
                }
            }
        }
        let reference = match current {
            ReferenceOr::Reference { reference } => reference.clone(),
            ReferenceOr::Item(_) => String::new(),
        };
        Err(EmissionError::UnresolvedRef(reference))
    }
}

fn status_code(code: &StatusCode) -> String {
    match code {
        StatusCode::Code(n) => n.to_string(),
        StatusCode::Range(n) => format!("{n}XX"),
    }
}

fn is_success(response: &IrResponse) -> bool {
    response.code.starts_with('2')
}

fn preferred_media(content: &IndexMap<String, MediaType>) -> Option<&MediaType> {
    content
        .get("application/json")
        .or_else(|| content.values().next())
}
