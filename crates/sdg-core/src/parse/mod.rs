pub mod graph;
pub mod source;

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::debug;
use openapiv3::OpenAPI;

use crate::error::ParseError;
pub use graph::DocumentGraph;
pub use source::SourceLocation;

/// Turns a document locator into an object graph.
pub trait SpecParser {
    fn parse(&self, locator: &str) -> Result<DocumentGraph, ParseError>;
}

/// Loads OpenAPI 3.x documents from local files or `http(s)` URLs.
#[derive(Debug, Clone)]
pub struct OpenApiParser {
    timeout: Duration,
}

impl Default for OpenApiParser {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl OpenApiParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn fetch(&self, url: &url::Url) -> Result<String, ParseError> {
        let fetch_err = |source| ParseError::Fetch {
            url: url.to_string(),
            source,
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(fetch_err)?;
        let response = client.get(url.clone()).send().map_err(fetch_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ParseError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(fetch_err)
    }
}

impl SpecParser for OpenApiParser {
    fn parse(&self, locator: &str) -> Result<DocumentGraph, ParseError> {
        let location = SourceLocation::classify(locator);
        if let Some(scheme) = location.unsupported_scheme() {
            return Err(ParseError::UnsupportedScheme(scheme.to_string()));
        }
        let content = match location {
            SourceLocation::Url(url) => {
                debug!("fetching {url}");
                self.fetch(&url)?
            }
            SourceLocation::Local(path) => {
                debug!("reading {}", path.display());
                fs::read_to_string(&path).map_err(|source| ParseError::Io {
                    path: path.clone(),
                    source,
                })?
            }
        };

        let spec = if looks_like_json(locator, &content) {
            from_json(&content)?
        } else {
            from_yaml(&content)?
        };
        Ok(DocumentGraph::new(locator, spec))
    }
}

fn looks_like_json(locator: &str, content: &str) -> bool {
    let by_extension = Path::new(locator)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    by_extension || content.trim_start().starts_with('{')
}

/// Parse an OpenAPI document from YAML.
pub fn from_yaml(input: &str) -> Result<OpenAPI, ParseError> {
    let spec: OpenAPI = serde_yaml_ng::from_str(input)?;
    validate_version(&spec)?;
    Ok(spec)
}

/// Parse an OpenAPI document from JSON.
pub fn from_json(input: &str) -> Result<OpenAPI, ParseError> {
    let spec: OpenAPI = serde_json::from_str(input)?;
    validate_version(&spec)?;
    Ok(spec)
}

fn validate_version(spec: &OpenAPI) -> Result<(), ParseError> {
    if !spec.openapi.starts_with("3.") {
        return Err(ParseError::UnsupportedVersion(spec.openapi.clone()));
    }
    Ok(())
}
