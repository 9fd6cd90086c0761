//! Code-point line buffer, cursor, and the virtual completion overlay.
//!
//! A `Line` is a flat `Vec<char>`: every code point is one cell and one
//! cursor step (no grapheme clustering). Embedded newlines split the buffer
//! into rows for coordinate reporting; motions that care about rows
//! (`motion::line_start`, `motion::line_end`) look for them explicitly.
//!
//! Every text mutation bumps `revision`. Consumers caching geometry derived
//! from the text (cursor coordinates, completion layout) compare revisions
//! instead of diffing content.

use std::fmt;
use std::ops::Range;
use tracing::trace;

pub mod motion;
mod overlay;

pub use overlay::{LineState, Preview, VirtualInsert};

/// Mutable line buffer with a cursor clamped to `[0, len]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    chars: Vec<char>,
    cursor: usize,
    revision: u64,
}

impl From<&str> for Line {
    fn from(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let cursor = chars.len();
        Self {
            chars,
            cursor,
            revision: 0,
        }
    }
}

impl From<String> for Line {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.chars {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a line and place the cursor (clamped).
    pub fn with_cursor(text: &str, cursor: usize) -> Self {
        let mut line = Self::from(text);
        line.set_cursor(cursor);
        line
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn char_at(&self, pos: usize) -> Option<char> {
        self.chars.get(pos).copied()
    }

    /// Place the cursor, clamping to the buffer length.
    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.chars.len());
    }

    /// Move the cursor by a signed delta, saturating at both ends.
    pub fn move_by(&mut self, delta: isize) {
        let target = if delta < 0 {
            self.cursor.saturating_sub(delta.unsigned_abs())
        } else {
            self.cursor.saturating_add(delta.unsigned_abs())
        };
        self.set_cursor(target);
    }

    /// Insert `text` at `at` (clamped). A cursor at or after the insertion
    /// point shifts right by the inserted length. Returns that length.
    pub fn insert(&mut self, at: usize, text: &str) -> usize {
        let at = at.min(self.chars.len());
        let inserted: Vec<char> = text.chars().collect();
        let n = inserted.len();
        if n == 0 {
            return 0;
        }
        self.chars.splice(at..at, inserted);
        if self.cursor >= at {
            self.cursor += n;
        }
        self.bump();
        trace!(target: "line", at, inserted = n, len = self.chars.len(), "insert");
        n
    }

    /// Insert at the cursor, leaving the cursor after the inserted text.
    pub fn insert_at_cursor(&mut self, text: &str) -> usize {
        self.insert(self.cursor, text)
    }

    /// Remove `range` (clamped) and return the removed text. The cursor keeps
    /// its position relative to the surviving text.
    pub fn delete(&mut self, range: Range<usize>) -> String {
        let len = self.chars.len();
        let start = range.start.min(len);
        let end = range.end.min(len);
        if start >= end {
            return String::new();
        }
        let removed: String = self.chars.drain(start..end).collect();
        if self.cursor >= end {
            self.cursor -= end - start;
        } else if self.cursor > start {
            self.cursor = start;
        }
        self.bump();
        trace!(target: "line", start, end, len = self.chars.len(), "delete");
        removed
    }

    /// Replace the whole buffer; the cursor moves to the end.
    pub fn set(&mut self, text: &str) {
        self.chars = text.chars().collect();
        self.cursor = self.chars.len();
        self.bump();
        trace!(target: "line", len = self.chars.len(), "set");
    }

    /// Remove everything, returning the old contents.
    pub fn clear(&mut self) -> String {
        let len = self.chars.len();
        self.delete(0..len)
    }

    /// Text in `range` (clamped).
    pub fn slice(&self, range: Range<usize>) -> String {
        let len = self.chars.len();
        let start = range.start.min(len);
        let end = range.end.min(len);
        if start >= end {
            return String::new();
        }
        self.chars[start..end].iter().collect()
    }

    /// Number of rows (embedded newlines + 1).
    pub fn line_count(&self) -> usize {
        1 + self.chars.iter().filter(|c| **c == '\n').count()
    }

    /// Row index containing `pos`.
    pub fn line_of(&self, pos: usize) -> usize {
        let pos = pos.min(self.chars.len());
        self.chars[..pos].iter().filter(|c| **c == '\n').count()
    }

    /// (row, column) of `pos`; the column counts code points from row start.
    pub fn coords(&self, pos: usize) -> (usize, usize) {
        let pos = pos.min(self.chars.len());
        let row = self.line_of(pos);
        let start = motion::line_start(&self.chars, pos);
        (row, pos - start)
    }

    pub fn cursor_coords(&self) -> (usize, usize) {
        self.coords(self.cursor)
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
