use std::path::PathBuf;

use log::warn;
use url::Url;

use crate::error::GenerationError;

/// Where a document is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Url(Url),
    Local(PathBuf),
}

impl SourceLocation {
    /// Classify a locator. `file:` URLs and drive-letter prefixes are local paths.
    pub fn classify(locator: &str) -> Self {
        match Url::parse(locator) {
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => SourceLocation::Local(path),
                Err(()) => SourceLocation::Local(PathBuf::from(url.path())),
            },
            Ok(url) if url.scheme().len() > 1 => SourceLocation::Url(url),
            _ => SourceLocation::Local(PathBuf::from(locator)),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, SourceLocation::Url(_))
    }

    /// The scheme of a URL that is neither http nor https.
    pub fn unsupported_scheme(&self) -> Option<&str> {
        match self {
            SourceLocation::Url(url) if !matches!(url.scheme(), "http" | "https") => Some(url.scheme()),
            _ => None,
        }
    }
}

/// Ensure the document can be loaded: a URL, or an existing local file.
///
/// URLs are not fetched here; the parser reports fetch failures.
pub fn check_reachable(locator: &str) -> Result<SourceLocation, GenerationError> {
    let location = SourceLocation::classify(locator);
    if let Some(scheme) = location.unsupported_scheme() {
        warn!("{locator}: scheme '{scheme}' is neither http nor https");
    }
    if let SourceLocation::Local(path) = &location {
        if !path.is_file() {
            return Err(GenerationError::SourceNotFound {
                locator: locator.to_string(),
            });
        }
    }
    Ok(location)
}
