use serde::Serialize;

use super::types::{Container, NormalizedName};

/// A named data-model definition, typed for the target backend.
#[derive(Debug, Clone, Serialize)]
pub struct IrModel {
    /// Definition name as declared in the document.
    pub name: String,
    pub classname: String,
    pub description: Option<String>,
    pub parent: Option<String>,
    pub properties: Vec<IrProperty>,
    /// Non-empty for string enums.
    pub enum_values: Vec<String>,
}

impl IrModel {
    pub fn is_enum(&self) -> bool {
        !self.enum_values.is_empty()
    }
}

/// A field on a model.
#[derive(Debug, Clone, Serialize)]
pub struct IrProperty {
    pub name: NormalizedName,
    /// Wire name as declared in the document.
    pub base_name: String,
    pub data_type: String,
    pub base_type: String,
    pub container: Option<Container>,
    pub required: bool,
    pub read_only: bool,
    pub description: Option<String>,
}
