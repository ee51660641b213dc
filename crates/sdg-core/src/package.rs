//! Package-name defaults and validation for a single document.

use std::path::PathBuf;

use log::info;

use crate::config::{SpecInfo, non_blank};
use crate::error::{GenerationError, MissingPackageError, PackageScope};

/// Fill in the model package from the API package when it is blank.
///
/// Returns `true` when the document was modified.
pub fn apply_defaults(info: &mut SpecInfo) -> bool {
    if info.model_package().is_some() {
        return false;
    }
    match info.api_package().map(str::to_string) {
        Some(api) => {
            info!(
                "modelPackage not set for {}, defaulting to apiPackage {}",
                info.source, api
            );
            info.model_package = Some(api);
            true
        }
        None => false,
    }
}

/// Check a document after defaults were applied.
pub fn validate(info: &SpecInfo) -> Result<(), GenerationError> {
    if !info.generates_api() && !info.generates_models() {
        return Err(GenerationError::NothingToGenerate {
            locator: info.source.clone(),
        });
    }
    for package in [info.api_package(), info.model_package()].into_iter().flatten() {
        if !is_valid_package_name(package) {
            return Err(GenerationError::InvalidPackage {
                locator: info.source.clone(),
                package: package.to_string(),
            });
        }
    }
    Ok(())
}

/// Return the package for an active scope, failing if it is blank.
pub fn require(scope: PackageScope, value: Option<&str>) -> Result<&str, MissingPackageError> {
    non_blank(value)
        .map(str::trim)
        .ok_or(MissingPackageError { scope })
}

/// `io.example.api` → `io/example/api`
pub fn package_to_path(package: &str) -> PathBuf {
    package.split('.').filter(|s| !s.is_empty()).collect()
}

/// Every dot-separated segment must be an identifier.
pub fn is_valid_package_name(package: &str) -> bool {
    package.trim().split('.').all(|segment| {
        let mut chars = segment.chars();
        match chars.next() {
            Some(first) if first.is_alphabetic() || first == '_' => {
                chars.all(|c| c.is_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}
