//! Positions and ranges inside a text document.
//!
//! Both are 0-indexed and serialize to the LSP wire shape
//! (`{ "line", "character" }` and `{ "start", "end" }`), so hosts can pass
//! them through without conversion.

use serde::{Deserialize, Serialize};

/// A 0-indexed line/column position. Columns count UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open span `[start, end)` of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Span of columns `[start_col, end_col)` on a single line.
    #[must_use]
    pub const fn on_line(line: u32, start_col: u32, end_col: u32) -> Self {
        Self {
            start: Position::new(line, start_col),
            end: Position::new(line, end_col),
        }
    }

    #[must_use]
    pub const fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
