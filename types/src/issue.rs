//! Issue messages reported by the validation service and their severities.

use serde::{Deserialize, Serialize};

use crate::range::TextRange;

/// The `type` of a service message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Error,
    Info,
    /// Problems with the request itself (I/O on the service side, bad encoding).
    NonDocumentError,
    /// Any type the service adds later. The raw value is kept for display.
    Other(String),
}

impl MessageKind {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "error" => Self::Error,
            "info" => Self::Info,
            "non-document-error" => Self::NonDocumentError,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Error => "error",
            Self::Info => "info",
            Self::NonDocumentError => "non-document-error",
            Self::Other(raw) => raw,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Severity level for a diagnostic shown in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl DiagnosticSeverity {
    /// Map a service message type to an editor severity.
    ///
    /// `info` becomes a warning: the service reports its warnings as `info`
    /// messages with a `warning` subtype, and the editor should surface them
    /// as such.
    #[must_use]
    pub fn from_message_kind(kind: &MessageKind) -> Self {
        match kind {
            MessageKind::Error => Self::Error,
            MessageKind::Info => Self::Warning,
            MessageKind::NonDocumentError | MessageKind::Other(_) => Self::Information,
        }
    }

    /// Convert from LSP numeric severity (1=Error, 2=Warning, 3=Info, 4=Hint).
    #[must_use]
    pub fn from_lsp(value: u64) -> Option<Self> {
        match value {
            1 => Some(Self::Error),
            2 => Some(Self::Warning),
            3 => Some(Self::Information),
            4 => Some(Self::Hint),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_lsp(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Information => "info",
            Self::Hint => "hint",
        }
    }
}

/// One problem reported by the validation service.
///
/// Line and column are 1-based, as the service reports them. Fields are
/// private; the message is immutable once received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueMessage {
    kind: MessageKind,
    line: u32,
    column: u32,
    length: u32,
    text: String,
}

impl IssueMessage {
    #[must_use]
    pub fn new(kind: MessageKind, line: u32, column: u32, length: u32, text: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            column,
            length,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// 1-based line number; 0 when the service did not report one.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-based column of the first highlighted character.
    #[must_use]
    pub fn column(&self) -> u32 {
        self.column
    }

    #[must_use]
    pub fn length(&self) -> u32 {
        self.length
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn severity(&self) -> DiagnosticSeverity {
        DiagnosticSeverity::from_message_kind(&self.kind)
    }

    /// 0-indexed line this message points at, if it points at one.
    #[must_use]
    pub fn line_index(&self) -> Option<u32> {
        self.line.checked_sub(1)
    }

    /// 0-indexed highlight span. `None` for messages without a line.
    #[must_use]
    pub fn range(&self) -> Option<TextRange> {
        let line = self.line_index()?;
        let start = self.column.saturating_sub(1);
        Some(TextRange::on_line(line, start, start.saturating_add(self.length)))
    }
}
