use openapiv3::{OpenAPI, Operation, PathItem, Paths, ReferenceOr};

use crate::ir::HttpMethod;

/// A parsed document, owned by one generation pass.
#[derive(Debug, Clone)]
pub struct DocumentGraph {
    locator: String,
    spec: OpenAPI,
}

impl DocumentGraph {
    pub fn new(locator: impl Into<String>, spec: OpenAPI) -> Self {
        Self {
            locator: locator.into(),
            spec,
        }
    }

    /// Path or URL the document was loaded from.
    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn spec(&self) -> &OpenAPI {
        &self.spec
    }

    pub fn spec_mut(&mut self) -> &mut OpenAPI {
        &mut self.spec
    }

    /// Drop every path, and with it every operation.
    pub fn clear_paths(&mut self) {
        self.spec.paths = Paths::default();
    }

    /// Drop every component schema definition.
    pub fn clear_definitions(&mut self) {
        if let Some(components) = self.spec.components.as_mut() {
            components.schemas.clear();
        }
    }

    /// Remove one named definition. Returns whether it existed.
    pub fn remove_definition(&mut self, name: &str) -> bool {
        self.spec
            .components
            .as_mut()
            .is_some_and(|c| c.schemas.shift_remove(name).is_some())
    }

    pub fn operation_count(&self) -> usize {
        self.spec
            .paths
            .paths
            .values()
            .filter_map(|item| match item {
                ReferenceOr::Item(item) => Some(path_operations(item).len()),
                ReferenceOr::Reference { .. } => None,
            })
            .sum()
    }

    pub fn definition_names(&self) -> Vec<&str> {
        self.spec
            .components
            .as_ref()
            .map(|c| c.schemas.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// The operations declared on a path item, in method order.
pub fn path_operations(item: &PathItem) -> Vec<(HttpMethod, &Operation)> {
    let mut ops = Vec::new();
    macro_rules! add_op {
        ($method:expr, $op:expr) => {
            if let Some(op) = $op.as_ref() {
                ops.push(($method, op));
            }
        };
    }

    add_op!(HttpMethod::Get, item.get);
    add_op!(HttpMethod::Post, item.post);
    add_op!(HttpMethod::Put, item.put);
    add_op!(HttpMethod::Delete, item.delete);
    add_op!(HttpMethod::Patch, item.patch);
    add_op!(HttpMethod::Options, item.options);
    add_op!(HttpMethod::Head, item.head);
    add_op!(HttpMethod::Trace, item.trace);

    ops
}
