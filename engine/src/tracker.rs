//! The list of diagnostics currently attributed to one document.

use webvalidator_types::{DiagnosticSeverity, IssueMessage, TextDocument, TextRange};

/// Line index plus the full text that line had when the diagnostic was
/// created. The diagnostic is only shown while the line still reads the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    line: u32,
    snapshot: String,
}

impl Anchor {
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[must_use]
    pub fn snapshot(&self) -> &str {
        &self.snapshot
    }

    /// Whether `document` still has this line with unchanged content.
    #[must_use]
    pub fn holds_in(&self, document: &TextDocument) -> bool {
        document.line(self.line) == Some(self.snapshot.as_str())
    }
}

/// One issue, positioned in the document and anchored for invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedDiagnostic {
    severity: DiagnosticSeverity,
    range: TextRange,
    message: String,
    source: String,
    anchor: Anchor,
}

impl TrackedDiagnostic {
    #[must_use]
    pub fn severity(&self) -> DiagnosticSeverity {
        self.severity
    }

    #[must_use]
    pub fn range(&self) -> TextRange {
        self.range
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Kind label reported by the service (`error`, `info`, ...).
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }
}

/// Ordered diagnostics bound to the URI they were recorded against.
///
/// Entries only leave through eviction ([`crate::refresh`]) or the clear
/// operations; nothing edits an entry in place.
#[derive(Debug, Default)]
pub struct IssueTracker {
    uri: Option<String>,
    entries: Vec<TrackedDiagnostic>,
}

impl IssueTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with `messages` anchored against `document`.
    ///
    /// Messages without a line, or pointing past the end of the document,
    /// are skipped. Returns the number of entries recorded.
    pub fn record(&mut self, messages: &[IssueMessage], document: &TextDocument) -> usize {
        self.entries.clear();
        self.uri = Some(document.uri().to_string());

        for message in messages {
            let (Some(line), Some(range)) = (message.line_index(), message.range()) else {
                tracing::debug!(kind = message.kind().as_str(), "Skipping message without a line");
                continue;
            };
            let Some(snapshot) = document.line(line) else {
                tracing::debug!(
                    line = message.line(),
                    lines = document.line_count(),
                    "Skipping message past end of document"
                );
                continue;
            };
            self.entries.push(TrackedDiagnostic {
                severity: message.severity(),
                range,
                message: message.text().to_string(),
                source: message.kind().as_str().to_string(),
                anchor: Anchor {
                    line,
                    snapshot: snapshot.to_string(),
                },
            });
        }

        self.entries.len()
    }

    /// Drop every entry. The URI binding is kept so the host can publish an
    /// empty set for it.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Keep only entries with Error severity.
    pub fn clear_non_errors(&mut self) {
        self.entries.retain(|entry| entry.severity.is_error());
    }

    pub(crate) fn retain(&mut self, keep: impl FnMut(&TrackedDiagnostic) -> bool) {
        self.entries.retain(keep);
    }

    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    #[must_use]
    pub fn is_bound_to(&self, uri: &str) -> bool {
        self.uri.as_deref() == Some(uri)
    }

    #[must_use]
    pub fn entries(&self) -> &[TrackedDiagnostic] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|e| e.severity.is_error()).count()
    }

    #[must_use]
    pub fn non_error_count(&self) -> usize {
        self.entries.len() - self.error_count()
    }
}
