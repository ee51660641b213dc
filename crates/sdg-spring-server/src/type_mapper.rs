use sdg_core::ir::IrType;
use sdg_core::transform::name_normalizer::normalize_name;

/// Map an `IrType` to its Java type string representation.
pub fn ir_type_to_java(ir_type: &IrType) -> String {
    match ir_type {
        IrType::String => "String".to_string(),
        IrType::Integer => "Integer".to_string(),
        IrType::Long => "Long".to_string(),
        IrType::Float => "Float".to_string(),
        IrType::Double => "Double".to_string(),
        IrType::Number => "BigDecimal".to_string(),
        IrType::Boolean => "Boolean".to_string(),
        IrType::Date => "LocalDate".to_string(),
        IrType::DateTime => "OffsetDateTime".to_string(),
        IrType::Uuid => "UUID".to_string(),
        IrType::Binary => "Resource".to_string(),
        IrType::ByteArray => "byte[]".to_string(),
        IrType::Ref(name) => normalize_name(name).pascal_case,
        IrType::Array(inner) => format!("List<{}>", ir_type_to_java(inner)),
        IrType::Map(value_type) => format!("Map<String, {}>", ir_type_to_java(value_type)),
        IrType::Object | IrType::Any => "Object".to_string(),
    }
}
