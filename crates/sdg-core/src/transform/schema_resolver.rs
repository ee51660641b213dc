use std::borrow::Borrow;

use openapiv3::{
    AdditionalProperties, IntegerFormat, NumberFormat, ReferenceOr, Schema, SchemaKind,
    StringFormat, Type, VariantOrUnknownOrEmpty,
};

use crate::ir::IrType;

/// Last segment of a `$ref`: `#/components/schemas/Pet` → `Pet`.
pub fn ref_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Convert a schema or reference to an `IrType`.
pub fn schema_or_ref_to_ir_type<S: Borrow<Schema>>(schema_or_ref: &ReferenceOr<S>) -> IrType {
    match schema_or_ref {
        ReferenceOr::Reference { reference } => IrType::Ref(ref_name(reference).to_string()),
        ReferenceOr::Item(schema) => schema_to_ir_type(schema.borrow()),
    }
}

/// Convert an inline schema to an `IrType`.
pub fn schema_to_ir_type(schema: &Schema) -> IrType {
    match &schema.schema_kind {
        SchemaKind::Type(t) => type_to_ir_type(t),
        // A single-member allOf is a plain alias of its member
        SchemaKind::AllOf { all_of } if all_of.len() == 1 => schema_or_ref_to_ir_type(&all_of[0]),
        SchemaKind::AllOf { .. } | SchemaKind::OneOf { .. } | SchemaKind::AnyOf { .. } => {
            IrType::Object
        }
        SchemaKind::Not { .. } => IrType::Any,
        SchemaKind::Any(any) => {
            if let Some(items) = &any.items {
                IrType::Array(Box::new(schema_or_ref_to_ir_type(items)))
            } else if !any.properties.is_empty() {
                IrType::Object
            } else {
                match any.typ.as_deref() {
                    Some("string") => IrType::String,
                    Some("integer") => IrType::Integer,
                    Some("number") => IrType::Number,
                    Some("boolean") => IrType::Boolean,
                    Some("object") => additional_to_ir_type(any.additional_properties.as_ref()),
                    _ => IrType::Any,
                }
            }
        }
    }
}

fn type_to_ir_type(t: &Type) -> IrType {
    match t {
        Type::String(s) => match &s.format {
            VariantOrUnknownOrEmpty::Item(StringFormat::Date) => IrType::Date,
            VariantOrUnknownOrEmpty::Item(StringFormat::DateTime) => IrType::DateTime,
            VariantOrUnknownOrEmpty::Item(StringFormat::Byte) => IrType::ByteArray,
            VariantOrUnknownOrEmpty::Item(StringFormat::Binary) => IrType::Binary,
            VariantOrUnknownOrEmpty::Unknown(f) if f == "uuid" => IrType::Uuid,
            _ => IrType::String,
        },
        Type::Integer(i) => match &i.format {
            VariantOrUnknownOrEmpty::Item(IntegerFormat::Int64) => IrType::Long,
            _ => IrType::Integer,
        },
        Type::Number(n) => match &n.format {
            VariantOrUnknownOrEmpty::Item(NumberFormat::Float) => IrType::Float,
            VariantOrUnknownOrEmpty::Item(NumberFormat::Double) => IrType::Double,
            _ => IrType::Number,
        },
        Type::Boolean { .. } => IrType::Boolean,
        Type::Array(a) => match &a.items {
            Some(items) => IrType::Array(Box::new(schema_or_ref_to_ir_type(items))),
            None => IrType::Array(Box::new(IrType::Any)),
        },
        Type::Object(o) => {
            if o.properties.is_empty() {
                additional_to_ir_type(o.additional_properties.as_ref())
            } else {
                // Inline objects are not promoted to named models
                IrType::Object
            }
        }
    }
}

fn additional_to_ir_type(additional: Option<&AdditionalProperties>) -> IrType {
    match additional {
        Some(AdditionalProperties::Schema(s)) => {
            IrType::Map(Box::new(schema_or_ref_to_ir_type(&**s)))
        }
        Some(AdditionalProperties::Any(true)) => IrType::Map(Box::new(IrType::Any)),
        Some(AdditionalProperties::Any(false)) | None => IrType::Object,
    }
}
