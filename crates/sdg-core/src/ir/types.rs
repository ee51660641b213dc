use std::fmt;

use serde::Serialize;

use super::models::IrModel;
use super::operations::IrOperation;

/// API metadata handed to every template.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IrInfo {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
}

/// A document after conversion: models plus ungrouped operations with their declaring paths.
#[derive(Debug, Clone, Default)]
pub struct IrDocument {
    pub info: IrInfo,
    pub models: Vec<IrModel>,
    pub operations: Vec<(String, IrOperation)>,
}

/// A name with multiple casing variants pre-computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedName {
    pub original: String,
    pub pascal_case: String,
    pub camel_case: String,
    pub snake_case: String,
    pub screaming_snake: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

/// Collection shape of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    List,
    Map,
}

/// A resolved type reference, independent of any target language.
#[derive(Debug, Clone, PartialEq)]
pub enum IrType {
    String,
    Integer,
    Long,
    Float,
    Double,
    Number,
    Boolean,
    Date,
    DateTime,
    Uuid,
    Binary,
    ByteArray,
    Array(Box<IrType>),
    Map(Box<IrType>),
    Ref(String), // reference to a named definition
    Object,
    Any,
}

impl IrType {
    /// Keyword used by type-mapping tables.
    pub fn keyword(&self) -> &'static str {
        match self {
            IrType::String => "string",
            IrType::Integer => "integer",
            IrType::Long => "long",
            IrType::Float => "float",
            IrType::Double => "double",
            IrType::Number => "number",
            IrType::Boolean => "boolean",
            IrType::Date => "date",
            IrType::DateTime => "date-time",
            IrType::Uuid => "uuid",
            IrType::Binary => "binary",
            IrType::ByteArray => "byte",
            IrType::Array(_) => "array",
            IrType::Map(_) => "map",
            IrType::Ref(_) => "ref",
            IrType::Object => "object",
            IrType::Any => "any",
        }
    }

    pub fn container(&self) -> Option<Container> {
        match self {
            IrType::Array(_) => Some(Container::List),
            IrType::Map(_) => Some(Container::Map),
            _ => None,
        }
    }

    /// Element type of a container, or the type itself.
    pub fn base(&self) -> &IrType {
        match self {
            IrType::Array(inner) | IrType::Map(inner) => inner.as_ref(),
            other => other,
        }
    }
}
