//! Glue between a trigger, the validator client and the host.
//!
//! Validation is split into [`Orchestrator::start_validation`], which issues
//! a [`ValidationTicket`], and [`Orchestrator::finish_validation`], which
//! applies the outcome for that ticket. Hosts that run the HTTP request
//! elsewhere (a spawned task) hold the ticket in between; only the newest
//! ticket's outcome is applied.

use std::time::Duration;

use webvalidator_client::ValidatorClient;
use webvalidator_config::EditorSettings;
use webvalidator_types::{DocumentKind, IssueMessage, TextDocument, ValidationFailure};

use crate::host::{Host, MessageLevel, SummaryAction, SummaryPrompt};
use crate::messages;
use crate::refresh::refresh;
use crate::status::{StatusPresenter, StatusState};
use crate::tracker::IssueTracker;

/// How long the silent "File is valid" status stays up.
pub const VALID_STATUS_DURATION: Duration = Duration::from_secs(2);

/// What asked for a validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The user ran the validate command. Problems are reported to them.
    Command,
    /// The document was saved. Runs only with `validate_on_save`.
    Save,
}

/// Proof that a validation was started, with the text that is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationTicket {
    generation: u64,
    kind: DocumentKind,
    snapshot: TextDocument,
}

impl ValidationTicket {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        self.snapshot.uri()
    }

    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Text as it was when the validation started.
    #[must_use]
    pub fn text(&self) -> &str {
        self.snapshot.text()
    }
}

/// How a validation ended, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Not started: no document, unsupported kind, or save validation off.
    Skipped,
    /// A newer validation or a clear superseded this one.
    Stale,
    Failed(ValidationFailure),
    Valid,
    Issues { errors: usize, warnings: usize },
}

/// Owns all validation state for one editor session.
pub struct Orchestrator<H: Host> {
    host: H,
    tracker: IssueTracker,
    status: StatusPresenter,
    settings: EditorSettings,
    generation: u64,
    /// URI of the document whose validation is running.
    in_flight: Option<String>,
}

impl<H: Host> Orchestrator<H> {
    /// Nothing reaches the host until [`Self::announce_status`] or the first
    /// operation.
    pub fn new(host: H, settings: EditorSettings) -> Self {
        Self {
            host,
            tracker: IssueTracker::new(),
            status: StatusPresenter::new(),
            settings,
            generation: 0,
            in_flight: None,
        }
    }

    /// Push the current status to the host, e.g. once it is ready to show it.
    pub fn announce_status(&mut self) {
        self.host.update_status(&self.status);
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    #[must_use]
    pub fn tracker(&self) -> &IssueTracker {
        &self.tracker
    }

    #[must_use]
    pub fn status(&self) -> &StatusPresenter {
        &self.status
    }

    #[must_use]
    pub fn settings(&self) -> EditorSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: EditorSettings) {
        if settings != self.settings {
            tracing::info!(
                show_popup = settings.show_popup,
                validate_on_save = settings.validate_on_save,
                "Editor settings changed"
            );
        }
        self.settings = settings;
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_validating(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Begin a validation of `document`.
    ///
    /// Returns `None` when nothing should be sent. On `Some`, the tracker has
    /// been cleared, the status shows loading, and any earlier ticket is
    /// stale.
    pub fn start_validation(
        &mut self,
        document: Option<&TextDocument>,
        trigger: Trigger,
    ) -> Option<ValidationTicket> {
        let explicit = trigger == Trigger::Command;

        let Some(document) = document else {
            if explicit {
                self.host.show_message(MessageLevel::Warning, messages::NO_DOCUMENT);
            }
            return None;
        };
        let Some(kind) = document.kind() else {
            if explicit {
                self.host
                    .show_message(MessageLevel::Warning, messages::UNSUPPORTED_DOCUMENT);
            }
            tracing::debug!(
                uri = document.uri(),
                language_id = document.language_id(),
                "Not validating unsupported document"
            );
            return None;
        };
        if trigger == Trigger::Save && !self.settings.validate_on_save {
            return None;
        }

        self.generation += 1;
        self.in_flight = Some(document.uri().to_string());
        self.clear_silently();
        self.status.show_loading();
        self.host.update_status(&self.status);

        tracing::info!(
            uri = document.uri(),
            kind = %kind,
            generation = self.generation,
            ?trigger,
            "Validation started"
        );

        Some(ValidationTicket {
            generation: self.generation,
            kind,
            snapshot: document.clone(),
        })
    }

    /// Apply the outcome of `ticket`'s request.
    ///
    /// `live` is the document as it is now; entries whose line changed
    /// while the request was running are evicted right away.
    pub fn finish_validation(
        &mut self,
        ticket: &ValidationTicket,
        outcome: Result<Vec<IssueMessage>, ValidationFailure>,
        live: Option<&TextDocument>,
    ) -> ValidationOutcome {
        if ticket.generation != self.generation || self.in_flight.is_none() {
            tracing::debug!(
                generation = ticket.generation,
                current = self.generation,
                "Dropping stale validation outcome"
            );
            return ValidationOutcome::Stale;
        }
        self.in_flight = None;

        let messages = match outcome {
            Ok(messages) => messages,
            Err(failure) => {
                self.host
                    .show_message(MessageLevel::Error, messages::failure(&failure));
                self.status.show_idle();
                self.host.update_status(&self.status);
                return ValidationOutcome::Failed(failure);
            }
        };

        if messages.is_empty() {
            self.report_valid(ticket);
            return ValidationOutcome::Valid;
        }

        let errors = messages.iter().filter(|m| m.kind().is_error()).count();
        let warnings = messages.len() - errors;

        self.tracker.record(&messages, &ticket.snapshot);
        if let Some(live) = live.filter(|doc| doc.uri() == ticket.uri()) {
            refresh(&mut self.tracker, live);
        }
        self.publish();

        if self.tracker.is_empty() {
            self.status.show_idle();
        } else {
            self.status.show_has_issues();
        }
        self.status.set_clear_visible(!self.tracker.is_empty());
        self.host.update_status(&self.status);

        tracing::info!(
            uri = ticket.uri(),
            errors,
            warnings,
            shown = self.tracker.len(),
            "Validation found issues"
        );

        if self.settings.show_popup {
            let mut actions = vec![SummaryAction::ClearAll];
            if warnings > 0 {
                actions.push(SummaryAction::ClearWarnings);
            }
            self.host.show_prompt(SummaryPrompt {
                uri: ticket.uri().to_string(),
                generation: ticket.generation,
                text: messages::document_invalid(ticket.kind, errors, warnings),
                actions,
            });
        }

        ValidationOutcome::Issues { errors, warnings }
    }

    fn report_valid(&mut self, ticket: &ValidationTicket) {
        tracing::info!(uri = ticket.uri(), "Document is valid");
        if self.settings.show_popup {
            self.host
                .show_message(MessageLevel::Info, &messages::document_valid(ticket.kind));
            self.status.show_valid(false);
        } else {
            self.status.show_valid(true);
            self.host
                .schedule_status_reset(self.generation, VALID_STATUS_DURATION);
        }
        self.host.update_status(&self.status);
    }

    /// Validate in one call: start, send, finish.
    pub async fn validate_now(
        &mut self,
        client: &ValidatorClient,
        document: &TextDocument,
        trigger: Trigger,
    ) -> ValidationOutcome {
        let Some(ticket) = self.start_validation(Some(document), trigger) else {
            return ValidationOutcome::Skipped;
        };
        let outcome = client.validate(ticket.text(), ticket.kind()).await;
        self.finish_validation(&ticket, outcome, Some(document))
    }

    /// Handle the user's choice from a summary prompt.
    ///
    /// Choices for a prompt older than the current validation are ignored.
    pub fn apply_summary_action(
        &mut self,
        generation: u64,
        action: SummaryAction,
        document: Option<&TextDocument>,
    ) {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "Ignoring answer to an outdated prompt"
            );
            return;
        }
        match action {
            SummaryAction::ClearAll => self.clear_diagnostics(),
            SummaryAction::ClearWarnings => {
                self.tracker.clear_non_errors();
                if let Some(document) = document {
                    refresh(&mut self.tracker, document);
                }
                self.publish();
                self.sync_after_eviction();
            }
        }
    }

    /// The clear command: drop every diagnostic and cancel a running
    /// validation.
    pub fn clear(&mut self) {
        if self.in_flight.take().is_some() {
            tracing::debug!(generation = self.generation, "Cancelling running validation");
            self.generation += 1;
        }
        self.clear_diagnostics();
    }

    /// Re-check the anchors after an edit.
    pub fn on_document_changed(&mut self, document: &TextDocument) {
        if !self.tracker.is_bound_to(document.uri()) || self.tracker.is_empty() {
            return;
        }
        let before = self.tracker.len();
        refresh(&mut self.tracker, document);
        if self.tracker.len() != before {
            self.publish();
            self.sync_after_eviction();
        }
    }

    pub fn on_document_saved(&mut self, document: &TextDocument) -> Option<ValidationTicket> {
        self.start_validation(Some(document), Trigger::Save)
    }

    /// Diagnostics for a closed document are withdrawn and a validation
    /// still running for it is cancelled.
    ///
    /// Returns `true` when a running validation was cancelled.
    pub fn on_document_closed(&mut self, uri: &str) -> bool {
        let cancelled = self.in_flight.as_deref() == Some(uri);
        if cancelled {
            tracing::debug!(
                uri,
                generation = self.generation,
                "Cancelling validation of closed document"
            );
            self.in_flight = None;
            self.generation += 1;
            self.clear_diagnostics();
        } else if self.tracker.is_bound_to(uri) && !self.tracker.is_empty() {
            self.clear_diagnostics();
        }
        cancelled
    }

    pub fn on_active_document_changed(&mut self, document: Option<&TextDocument>) {
        let supported = document.and_then(TextDocument::kind).is_some();
        self.status.reflect_document(supported);
        self.host.update_status(&self.status);
    }

    /// Revert the transient valid status, unless something happened since.
    pub fn reset_status(&mut self, generation: u64) {
        if generation != self.generation || self.status.state() != StatusState::Valid {
            return;
        }
        self.status.show_idle();
        self.host.update_status(&self.status);
    }

    fn publish(&mut self) {
        if let Some(uri) = self.tracker.uri() {
            self.host.publish_diagnostics(uri, self.tracker.entries());
        }
    }

    /// Empty the tracker and hide the clear item without touching the
    /// validate item.
    fn clear_silently(&mut self) {
        self.tracker.clear_all();
        self.publish();
        self.status.set_clear_visible(false);
    }

    fn clear_diagnostics(&mut self) {
        self.clear_silently();
        if matches!(self.status.state(), StatusState::HasIssues | StatusState::Loading) {
            self.status.show_idle();
        }
        self.host.update_status(&self.status);
    }

    fn sync_after_eviction(&mut self) {
        let all_cleared = self.tracker.is_empty();
        self.status.set_clear_visible(!all_cleared);
        if all_cleared && self.status.state() == StatusState::HasIssues {
            self.status.show_idle();
        }
        self.host.update_status(&self.status);
    }
}
