//! User-facing text.

use webvalidator_types::{DocumentKind, ValidationFailure};

pub const NO_DOCUMENT: &str = "Open a supported file first. (CSS/HTML)";
pub const UNSUPPORTED_DOCUMENT: &str = "Not an HTML or CSS file.";
pub const SERVICE_UNREACHABLE: &str =
    "W3C service not reachable, please check your internet connection.";
pub const SERVICE_UNAVAILABLE: &str = "W3C service currently unavailable. Please retry later...";
pub const TRANSPORT_ERROR: &str = "An error occurred.";
pub const MALFORMED_RESPONSE: &str = "Error : incorrect response from W3C...";
pub const VALID_STATUS_TEXT: &str = "File is valid";
/// Title of the progress notification shown while a request is pending.
pub const PROGRESS_TITLE: &str = "W3C validation ...";

#[must_use]
pub fn failure(failure: &ValidationFailure) -> &'static str {
    match failure {
        ValidationFailure::Unreachable { .. } => SERVICE_UNREACHABLE,
        ValidationFailure::ServiceUnavailable => SERVICE_UNAVAILABLE,
        ValidationFailure::Transport { .. } => TRANSPORT_ERROR,
        ValidationFailure::MalformedResponse { .. } => MALFORMED_RESPONSE,
    }
}

#[must_use]
pub fn document_valid(kind: DocumentKind) -> String {
    format!("This {} file is valid !", kind.label())
}

#[must_use]
pub fn document_invalid(kind: DocumentKind, errors: usize, warnings: usize) -> String {
    format!(
        "This {} document is not valid. ({errors} errors , {warnings} warnings)",
        kind.label()
    )
}
