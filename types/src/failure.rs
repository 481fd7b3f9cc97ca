//! Why one validation attempt produced no issue list.

use thiserror::Error;

/// Terminal failure of a single validation attempt. Nothing is retried; the
/// next trigger starts from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// DNS resolution or TCP/TLS connect failed.
    #[error("validation service unreachable: {detail}")]
    Unreachable { detail: String },

    /// The service answered HTTP 503.
    #[error("validation service unavailable (HTTP 503)")]
    ServiceUnavailable,

    /// Any other transport problem: unexpected status, timeout, body read.
    #[error("transport error: {detail}")]
    Transport { detail: String },

    /// The body was not the expected `{ "messages": [...] }` document.
    #[error("malformed response: {detail}")]
    MalformedResponse { detail: String },
}

impl ValidationFailure {
    /// Stable identifier for logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "network-unreachable",
            Self::ServiceUnavailable => "service-unavailable",
            Self::Transport { .. } => "transport-error",
            Self::MalformedResponse { .. } => "malformed-response",
        }
    }
}
