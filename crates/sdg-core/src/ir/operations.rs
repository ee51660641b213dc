use indexmap::IndexMap;
use serde::Serialize;

use super::types::{Container, NormalizedName};
use crate::transform::name_normalizer::{normalize_name, route_to_name};

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }
}

/// Operations keyed by group name, in insertion order.
pub type OperationGroups = IndexMap<String, Vec<IrOperation>>;

/// One path + method pair, typed for the target backend.
#[derive(Debug, Clone, Serialize)]
pub struct IrOperation {
    pub operation_id: NormalizedName,
    pub method: HttpMethod,
    /// Path relative to the operation's group once grouped.
    pub path: String,
    /// Path as declared in the document.
    pub original_path: String,
    /// Route below the group's mount point, path variables kept.
    pub mapping_path: String,
    /// Group the operation was assigned to.
    pub base_name: String,
    pub is_sub_resource: bool,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub parameters: Vec<IrParameter>,
    pub body_param: Option<IrBodyParameter>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub responses: Vec<IrResponse>,
    pub return_type: Option<String>,
    pub return_base_type: Option<String>,
    pub return_container: Option<Container>,
    pub vendor_extensions: IndexMap<String, serde_json::Value>,
}

impl IrOperation {
    /// A bare operation, named after its route.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            operation_id: normalize_name(&route_to_name(method.as_str(), &path)),
            method,
            original_path: path.clone(),
            mapping_path: path.clone(),
            path,
            base_name: String::new(),
            is_sub_resource: false,
            summary: None,
            description: None,
            tags: Vec::new(),
            deprecated: false,
            parameters: Vec::new(),
            body_param: None,
            consumes: Vec::new(),
            produces: Vec::new(),
            responses: Vec::new(),
            return_type: None,
            return_base_type: None,
            return_container: None,
            vendor_extensions: IndexMap::new(),
        }
    }

    pub fn with_response(mut self, code: &str, data_type: Option<&str>) -> Self {
        self.responses.push(IrResponse {
            code: code.to_string(),
            message: String::new(),
            data_type: data_type.map(str::to_string),
            container: None,
        });
        self
    }

    pub fn path_params(&self) -> impl Iterator<Item = &IrParameter> {
        self.parameters
            .iter()
            .filter(|p| p.location == IrParameterLocation::Path)
    }
}

/// A declared response for one status code. The default response has code `"0"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IrResponse {
    pub code: String,
    pub message: String,
    pub data_type: Option<String>,
    pub container: Option<Container>,
}

/// A resolved path/query/header/cookie parameter.
#[derive(Debug, Clone, Serialize)]
pub struct IrParameter {
    pub name: NormalizedName,
    pub base_name: String,
    pub location: IrParameterLocation,
    pub data_type: String,
    pub required: bool,
    pub description: Option<String>,
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IrParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// The request body of an operation.
#[derive(Debug, Clone, Serialize)]
pub struct IrBodyParameter {
    pub data_type: String,
    pub required: bool,
    pub description: Option<String>,
    pub content_type: String,
}
