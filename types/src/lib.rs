//! Core domain types for webvalidator.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod document;
mod failure;
mod issue;
mod range;

pub use document::{DocumentKind, TextDocument};
pub use failure::ValidationFailure;
pub use issue::{DiagnosticSeverity, IssueMessage, MessageKind};
pub use range::{Position, TextRange};
