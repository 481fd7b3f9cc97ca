//! Text documents as the host editor sees them.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::range::{Position, TextRange};

/// The document languages the validation service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Html,
    Css,
}

impl DocumentKind {
    /// Resolve an editor language id. Matching is case-insensitive and exact:
    /// `html`, `HTML` and `Html` are accepted, `htmlx` is not.
    #[must_use]
    pub fn from_language_id(language_id: &str) -> Option<Self> {
        let id = language_id.trim();
        if id.eq_ignore_ascii_case("html") {
            Some(Self::Html)
        } else if id.eq_ignore_ascii_case("css") {
            Some(Self::Css)
        } else {
            None
        }
    }

    /// Resolve a file path by extension, for hosts that work with files on disk.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" | "xhtml" => Some(Self::Html),
            "css" => Some(Self::Css),
            _ => None,
        }
    }

    /// Upper-case label used in user messages and the request content type.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Html => "HTML",
            Self::Css => "CSS",
        }
    }

    /// Editor language id for this kind.
    #[must_use]
    pub const fn language_id(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Css => "css",
        }
    }

    /// Value of the `Content-Type` header sent with the document body.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Html => "text/HTML; charset=utf-8",
            Self::Css => "text/CSS; charset=utf-8",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A snapshot of one open document.
///
/// Lines are split on `\n` with a trailing `\r` stripped, so `"a\r\nb"` has
/// the lines `a` and `b`. A trailing newline produces a final empty line,
/// matching how editors count lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextDocument {
    uri: String,
    language_id: String,
    version: i32,
    text: String,
}

impl TextDocument {
    #[must_use]
    pub fn new(
        uri: impl Into<String>,
        language_id: impl Into<String>,
        version: i32,
        text: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            language_id: language_id.into(),
            version,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    #[must_use]
    pub fn version(&self) -> i32 {
        self.version
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// `None` when the language id is not one the service validates.
    #[must_use]
    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_language_id(&self.language_id)
    }

    /// Replace the whole content (full-document sync).
    pub fn replace_text(&mut self, text: impl Into<String>, version: i32) {
        self.text = text.into();
        self.version = version;
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    /// Text of the 0-indexed line without its terminator.
    #[must_use]
    pub fn line(&self, index: u32) -> Option<&str> {
        self.text
            .split('\n')
            .nth(index as usize)
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
    }

    /// Range covering the whole 0-indexed line, terminator excluded.
    #[must_use]
    pub fn line_range(&self, index: u32) -> Option<TextRange> {
        let line = self.line(index)?;
        let width = line.encode_utf16().count() as u32;
        Some(TextRange::new(
            Position::new(index, 0),
            Position::new(index, width),
        ))
    }
}
