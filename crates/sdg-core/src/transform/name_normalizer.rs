use heck::{ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase};

use crate::ir::NormalizedName;

/// Compute every casing variant of an arbitrary name.
pub fn normalize_name(name: &str) -> NormalizedName {
    let sanitized = sanitize_identifier(name);

    NormalizedName {
        original: name.to_string(),
        pascal_case: sanitized.to_pascal_case(),
        camel_case: sanitized.to_lower_camel_case(),
        snake_case: sanitized.to_snake_case(),
        screaming_snake: sanitized.to_shouty_snake_case(),
    }
}

/// PascalCase class name with a suffix; an empty group becomes `Default{suffix}`.
///
/// `class_name("pets", "RestController")` → `PetsRestController`
pub fn class_name(name: &str, suffix: &str) -> String {
    if name.trim().is_empty() {
        return format!("Default{suffix}");
    }
    format!("{}{suffix}", normalize_name(name).pascal_case)
}

/// Derive a camelCase operation id from HTTP method + path when the document has none.
///
/// - `GET /pets` → `listPets`
/// - `GET /pets/{petId}` → `getPet`
/// - `POST /pets/{petId}/photos` → `createPetsPhotos`
pub fn route_to_name(method: &str, path: &str) -> String {
    let mut resource_parts: Vec<&str> = Vec::new();
    let mut ends_with_param = false;

    for seg in path.split('/').filter(|s| !s.is_empty()) {
        ends_with_param = seg.starts_with('{') && seg.ends_with('}');
        if !ends_with_param {
            resource_parts.push(seg);
        }
    }

    let prefix = match method.to_uppercase().as_str() {
        "GET" if ends_with_param => "get",
        "GET" => "list",
        "POST" => "create",
        "PUT" => "update",
        "DELETE" => "delete",
        "PATCH" => "patch",
        "OPTIONS" => "options",
        "HEAD" => "head",
        _ => "trace",
    };

    let last = resource_parts.len().saturating_sub(1);
    let resource: String = resource_parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            if i == last && ends_with_param {
                singularize(part).to_pascal_case()
            } else {
                part.to_pascal_case()
            }
        })
        .collect();

    format!("{prefix}{resource}")
}

/// Naive singularization for route-derived names.
fn singularize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies").filter(|s| !s.is_empty()) {
        format!("{stem}y")
    } else if word.ends_with("ses") || word.ends_with("xes") || word.ends_with("zes") {
        word[..word.len() - 2].to_string()
    } else if word.len() > 1 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Keep alphanumerics, turn every run of other characters into one `_`.
fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.chars() {
        if !ch.is_alphanumeric() {
            pending_separator = true;
            continue;
        }
        if result.is_empty() && ch.is_ascii_digit() {
            result.push('_');
        } else if pending_separator && !result.is_empty() {
            result.push('_');
        }
        result.push(ch);
        pending_separator = false;
    }

    if result.is_empty() {
        return "unnamed".to_string();
    }
    result
}
