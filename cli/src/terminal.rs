//! A [`Host`] that prints to a terminal.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use webvalidator_engine::{Host, MessageLevel, StatusPresenter, SummaryPrompt, TrackedDiagnostic};
use webvalidator_types::{DiagnosticSeverity, DocumentKind, TextDocument};

/// Prints diagnostics as `path:line:col: severity: message`, 1-based.
pub(crate) struct TerminalHost<W> {
    out: W,
    display: String,
}

impl<W: Write> TerminalHost<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            display: String::new(),
        }
    }

    /// Label used for the file currently being validated.
    pub fn set_display(&mut self, display: impl Into<String>) {
        self.display = display.into();
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            tracing::warn!("Failed to write to terminal: {e}");
        }
    }
}

impl<W: Write> Host for TerminalHost<W> {
    fn publish_diagnostics(&mut self, _uri: &str, diagnostics: &[TrackedDiagnostic]) {
        for diagnostic in diagnostics {
            let start = diagnostic.range().start;
            let text = format!(
                "{}:{}:{}: {}: {}",
                self.display,
                start.line + 1,
                start.character + 1,
                severity_label(diagnostic.severity()),
                diagnostic.message()
            );
            self.line(&text);
        }
    }

    fn update_status(&mut self, status: &StatusPresenter) {
        tracing::trace!(state = %status.state(), "Status");
    }

    fn show_message(&mut self, level: MessageLevel, text: &str) {
        let text = match level {
            MessageLevel::Error => format!("{}: error: {text}", self.display),
            MessageLevel::Warning => format!("{}: warning: {text}", self.display),
            MessageLevel::Info => format!("{}: {text}", self.display),
        };
        self.line(&text);
    }

    fn show_prompt(&mut self, prompt: SummaryPrompt) {
        let text = format!("{}: {}", self.display, prompt.text);
        self.line(&text);
    }

    fn schedule_status_reset(&mut self, _generation: u64, _delay: Duration) {}
}

fn severity_label(severity: DiagnosticSeverity) -> &'static str {
    match severity {
        DiagnosticSeverity::Error => "error",
        DiagnosticSeverity::Warning => "warning",
        DiagnosticSeverity::Information | DiagnosticSeverity::Hint => "info",
    }
}

/// Wrap file contents as a document. Unknown extensions get a language id
/// the engine rejects as unsupported.
pub(crate) fn document_from_file(path: &Path, text: String) -> TextDocument {
    let uri = std::fs::canonicalize(path)
        .ok()
        .and_then(|absolute| url::Url::from_file_path(absolute).ok())
        .map_or_else(|| path.display().to_string(), |url| url.to_string());
    let language_id = DocumentKind::from_path(path).map_or("plaintext", DocumentKind::language_id);
    TextDocument::new(uri, language_id, 0, text)
}
