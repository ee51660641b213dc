//! Collapse per-status response types into one generic envelope.

use log::debug;

use crate::ir::{HttpMethod, IrOperation, IrResponse};

/// Status code the IR uses for the `default` response.
pub const DEFAULT_RESPONSE_CODE: &str = "0";

/// Status the default response is emitted as.
pub const FALLBACK_ERROR_CODE: &str = "500";

/// Vendor extension telling templates whether to negotiate a request content type.
pub const CONSUMES_EXPECTED: &str = "x-consumes-expected";

/// Vendor extension set when the response set declares more than one body type.
pub const MULTIPLE_RESPONSE_TYPES: &str = "x-multiple-response-types";

/// Methods that carry no request body by convention.
const METHODS_WITHOUT_BODY: [HttpMethod; 2] = [HttpMethod::Get, HttpMethod::Head];

/// Rewrites every operation to return `envelope`.
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    envelope: String,
}

impl ResponseNormalizer {
    pub fn new(envelope: impl Into<String>) -> Self {
        Self {
            envelope: envelope.into(),
        }
    }

    pub fn envelope(&self) -> &str {
        &self.envelope
    }

    /// Normalize one operation. Returns whether multiple response types were found.
    pub fn normalize(&self, op: &mut IrOperation) -> bool {
        let consumes_expected = !METHODS_WITHOUT_BODY.contains(&op.method);
        op.vendor_extensions
            .insert(CONSUMES_EXPECTED.to_string(), consumes_expected.into());

        let multiple = has_multiple_response_types(&op.responses);
        for response in &mut op.responses {
            if response.code == DEFAULT_RESPONSE_CODE {
                debug!(
                    "{}: default response emitted as HTTP {}",
                    op.operation_id, FALLBACK_ERROR_CODE
                );
                response.code = FALLBACK_ERROR_CODE.to_string();
            }
        }

        debug!(
            "{}: return type {:?} ({:?}) -> {}",
            op.operation_id, op.return_type, op.return_container, self.envelope
        );
        op.return_type = Some(self.envelope.clone());
        if multiple {
            op.return_container = None;
        }
        op.vendor_extensions
            .insert(MULTIPLE_RESPONSE_TYPES.to_string(), multiple.into());
        multiple
    }

    pub fn normalize_all<'a>(&self, ops: impl IntoIterator<Item = &'a mut IrOperation>) {
        for op in ops {
            self.normalize(op);
        }
    }
}

/// Whether any response declares a body type different from the first one.
///
/// Blank matches blank only; populated types compare case-insensitively.
pub fn has_multiple_response_types(responses: &[IrResponse]) -> bool {
    let Some(first) = responses.first() else {
        return false;
    };
    let first = blank_to_none(first.data_type.as_deref());
    responses
        .iter()
        .any(|r| match (first, blank_to_none(r.data_type.as_deref())) {
            (None, None) => false,
            (Some(a), Some(b)) => !a.eq_ignore_ascii_case(b),
            _ => true,
        })
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
