//! Client for the W3C Nu HTML Checker.
//!
//! One call, one HTTP request: the raw document text is POSTed with a
//! `text/HTML` or `text/CSS` content type, and the JSON `messages` array of
//! the response becomes a list of [`IssueMessage`]s.
//!
//! # Error Handling
//!
//! Every failure is a [`ValidationFailure`]. Nothing is retried; the caller
//! decides whether to surface the failure to the user.
//!
//! | Condition | Failure |
//! |-----------|---------|
//! | DNS or connect error | [`ValidationFailure::Unreachable`] |
//! | HTTP 503 | [`ValidationFailure::ServiceUnavailable`] |
//! | other status, timeout, body read error | [`ValidationFailure::Transport`] |
//! | body is not `{ "messages": [...] }` | [`ValidationFailure::MalformedResponse`] |

mod response;

use std::time::Instant;

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use thiserror::Error;

use webvalidator_config::ClientSettings;
use webvalidator_types::{DocumentKind, IssueMessage, ValidationFailure};

const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Error)]
#[error("failed to build HTTP client: {0}")]
pub struct ClientBuildError(#[from] reqwest::Error);

/// Sends documents to the validation service.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ValidatorClient {
    http: reqwest::Client,
    endpoint: reqwest::Url,
}

impl ValidatorClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientBuildError> {
        let mut builder = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(&settings.user_agent);

        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        if settings.accept_invalid_certs {
            tracing::warn!(
                "accept_invalid_certs is enabled: TLS certificate validation is disabled for validator requests"
            );
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        Ok(Self {
            http: builder.build()?,
            endpoint: settings.endpoint.clone(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    /// Validate one document.
    pub async fn validate(
        &self,
        text: &str,
        kind: DocumentKind,
    ) -> Result<Vec<IssueMessage>, ValidationFailure> {
        let started = Instant::now();
        tracing::debug!(
            endpoint = %self.endpoint,
            kind = %kind,
            bytes = text.len(),
            "Sending document to validator"
        );

        let result = self.send(text, kind).await;

        match &result {
            Ok(messages) => tracing::info!(
                kind = %kind,
                count = messages.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Validation completed"
            ),
            Err(failure) => tracing::warn!(
                kind = %kind,
                code = failure.code(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Validation failed: {failure}"
            ),
        }

        result
    }

    async fn send(
        &self,
        text: &str,
        kind: DocumentKind,
    ) -> Result<Vec<IssueMessage>, ValidationFailure> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, kind.content_type())
            .body(text.to_owned())
            .send()
            .await
            .map_err(|e| classify_send_error(&e))?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(ValidationFailure::ServiceUnavailable);
        }
        if !status.is_success() {
            return Err(ValidationFailure::Transport {
                detail: format!("unexpected HTTP status {status}"),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ValidationFailure::Transport {
                detail: format!("failed to read response body: {e}"),
            })?;

        response::parse_messages(&body)
    }
}

fn classify_send_error(err: &reqwest::Error) -> ValidationFailure {
    if err.is_connect() {
        ValidationFailure::Unreachable {
            detail: err.to_string(),
        }
    } else if err.is_timeout() {
        ValidationFailure::Transport {
            detail: "request timed out".to_string(),
        }
    } else {
        ValidationFailure::Transport {
            detail: err.to_string(),
        }
    }
}
