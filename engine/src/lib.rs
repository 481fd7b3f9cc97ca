//! Validation state for one editor session.
//!
//! [`Orchestrator`] owns the [`IssueTracker`] and the [`StatusPresenter`]
//! and drives a [`Host`] (the editor side). It never talks to the editor
//! directly, so the same engine backs the language server and the terminal
//! checker.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod host;
pub mod messages;
mod orchestrator;
mod refresh;
mod status;
mod tracker;

pub use host::{Host, MessageLevel, SummaryAction, SummaryPrompt};
pub use orchestrator::{
    Orchestrator, Trigger, VALID_STATUS_DURATION, ValidationOutcome, ValidationTicket,
};
pub use refresh::refresh;
pub use status::{
    CLEAR_VALIDATION_COMMAND, START_VALIDATION_COMMAND, StatusItem, StatusPresenter, StatusState,
};
pub use tracker::{Anchor, IssueTracker, TrackedDiagnostic};
