//! The editor-facing side the orchestrator drives.

use std::time::Duration;

use crate::status::StatusPresenter;
use crate::tracker::TrackedDiagnostic;

/// Severity of a user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Error,
    Warning,
    Info,
}

impl MessageLevel {
    /// LSP `MessageType` value.
    #[must_use]
    pub fn to_lsp(self) -> u8 {
        match self {
            Self::Error => 1,
            Self::Warning => 2,
            Self::Info => 3,
        }
    }
}

/// Follow-up offered after a validation that found issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryAction {
    ClearAll,
    ClearWarnings,
}

impl SummaryAction {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::ClearAll => "Clear all",
            Self::ClearWarnings => "Clear warnings",
        }
    }

    #[must_use]
    pub fn from_title(title: &str) -> Option<Self> {
        match title {
            "Clear all" => Some(Self::ClearAll),
            "Clear warnings" => Some(Self::ClearWarnings),
            _ => None,
        }
    }
}

/// An error-level message with action buttons. The chosen action goes back
/// to [`crate::Orchestrator::apply_summary_action`] with `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPrompt {
    pub uri: String,
    pub generation: u64,
    pub text: String,
    pub actions: Vec<SummaryAction>,
}

pub trait Host {
    /// Replace every diagnostic shown for `uri`. An empty slice clears them.
    fn publish_diagnostics(&mut self, uri: &str, diagnostics: &[TrackedDiagnostic]);

    fn update_status(&mut self, status: &StatusPresenter);

    fn show_message(&mut self, level: MessageLevel, text: &str);

    fn show_prompt(&mut self, prompt: SummaryPrompt);

    /// Call [`crate::Orchestrator::reset_status`] with `generation` once
    /// `delay` has passed.
    fn schedule_status_reset(&mut self, generation: u64, delay: Duration);
}
