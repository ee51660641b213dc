//! Partition operations into handler groups by their top-level resource.

use log::debug;

use super::operations::{IrOperation, OperationGroups};

/// Group key for operations whose declaring path has no first segment.
pub const DEFAULT_GROUP: &str = "ungrouped";

/// Group key for untagged operations under tag grouping.
pub const DEFAULT_TAG_GROUP: &str = "default";

/// Derive the group key from a declaring path.
/// e.g. "/pets/{petId}" → "pets", "/" → "ungrouped"
pub fn group_key(declaring_path: &str) -> String {
    let trimmed = declaring_path.strip_prefix('/').unwrap_or(declaring_path);
    let candidate = trimmed.split('/').next().unwrap_or_default();
    if candidate.is_empty() {
        DEFAULT_GROUP.to_string()
    } else {
        candidate.to_string()
    }
}

/// Assign `op` to the group derived from `declaring_path`, rewriting its path
/// relative to that resource. Returns the group key.
///
/// The relative path is always computed from `original_path`, so assigning the
/// same operation twice leaves it unchanged.
pub fn assign_group(op: &mut IrOperation, declaring_path: &str) -> String {
    let key = group_key(declaring_path);
    if key != DEFAULT_GROUP {
        let prefix = format!("/{key}");
        if let Some(rest) = below_resource(&op.original_path, &prefix) {
            op.mapping_path = rest.to_string();
            op.path = strip_identity(rest).to_string();
        }
        op.is_sub_resource = !op.path.is_empty();
    }
    debug!(
        "operation {} {} -> group {} (path: {:?}, mapping: {:?}, sub-resource: {})",
        op.method.as_str(),
        op.original_path,
        key,
        op.path,
        op.mapping_path,
        op.is_sub_resource
    );
    op.base_name = key.clone();
    key
}

/// Assign `op` to its group and append it. The first operation for a key creates the group.
pub fn add_operation_to_group(groups: &mut OperationGroups, declaring_path: &str, mut op: IrOperation) {
    let key = assign_group(&mut op, declaring_path);
    groups.entry(key).or_default().push(op);
}

/// Group by the operation's first tag, or [`DEFAULT_TAG_GROUP`] when untagged. Paths are kept.
pub fn add_operation_to_tag_group(groups: &mut OperationGroups, mut op: IrOperation) {
    let key = op
        .tags
        .first()
        .filter(|tag| !tag.trim().is_empty())
        .cloned()
        .unwrap_or_else(|| DEFAULT_TAG_GROUP.to_string());
    op.base_name = key.clone();
    groups.entry(key).or_default().push(op);
}

/// The part of `path` after `/resource`, on segment boundaries only.
fn below_resource<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

/// Drop a leading `{id}` segment.
fn strip_identity(rest: &str) -> &str {
    let identity = rest
        .strip_prefix('/')
        .and_then(|r| r.split('/').next())
        .filter(|seg| seg.starts_with('{') && seg.ends_with('}'));
    match identity {
        Some(seg) => &rest[seg.len() + 1..],
        None => rest,
    }
}
