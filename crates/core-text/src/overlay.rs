//! Virtual overlay: a previewed completion spliced into a copy of the line.
//!
//! The committed line is never touched while a candidate is previewed.
//! `LineState` is a tagged union so there is no separate "composed" buffer to
//! forget about: leaving `Previewing` either promotes the composed line
//! (`accept_virtual`) or discards it (`drop_virtual`).

use crate::Line;
use tracing::trace;

/// Text spliced at the cursor: `replace` code points immediately before the
/// cursor are removed, then `text` is inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualInsert {
    pub replace: usize,
    pub text: String,
}

impl VirtualInsert {
    pub fn new(replace: usize, text: impl Into<String>) -> Self {
        Self {
            replace,
            text: text.into(),
        }
    }

    /// Insertion that appends after the cursor without replacing anything.
    pub fn append(text: impl Into<String>) -> Self {
        Self::new(0, text)
    }
}

/// Previewed candidate and the line composed from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    insert: VirtualInsert,
    composed: Line,
}

impl Preview {
    pub fn insert(&self) -> &VirtualInsert {
        &self.insert
    }

    pub fn composed(&self) -> &Line {
        &self.composed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineState {
    Committed(Line),
    Previewing { line: Line, preview: Preview },
}

impl Default for LineState {
    fn default() -> Self {
        LineState::Committed(Line::default())
    }
}

impl From<Line> for LineState {
    fn from(line: Line) -> Self {
        LineState::Committed(line)
    }
}

impl LineState {
    pub fn new(line: Line) -> Self {
        LineState::Committed(line)
    }

    /// The real (committed) line, regardless of any preview.
    pub fn line(&self) -> &Line {
        match self {
            LineState::Committed(line) | LineState::Previewing { line, .. } => line,
        }
    }

    /// Mutable access to the real line. Any preview is dropped first: a
    /// composed line derived from stale text must never survive an edit.
    pub fn line_mut(&mut self) -> &mut Line {
        if self.is_previewing() {
            trace!(target: "line.overlay", "preview_dropped_on_edit");
            self.drop_virtual();
        }
        match self {
            LineState::Committed(line) | LineState::Previewing { line, .. } => line,
        }
    }

    /// The line the user sees: the composed line while previewing.
    pub fn logical(&self) -> &Line {
        match self {
            LineState::Committed(line) => line,
            LineState::Previewing { preview, .. } => &preview.composed,
        }
    }

    pub fn preview(&self) -> Option<&Preview> {
        match self {
            LineState::Committed(_) => None,
            LineState::Previewing { preview, .. } => Some(preview),
        }
    }

    pub fn is_previewing(&self) -> bool {
        matches!(self, LineState::Previewing { .. })
    }

    /// Compose `insert` against the real line at its cursor. Re-composing
    /// replaces any earlier preview; the result only depends on the real line
    /// and `insert`.
    pub fn virtual_compose(&mut self, insert: VirtualInsert) {
        let line = match std::mem::take(self) {
            LineState::Committed(line) | LineState::Previewing { line, .. } => line,
        };
        let mut composed = line.clone();
        let cursor = composed.cursor();
        let start = cursor.saturating_sub(insert.replace);
        composed.delete(start..cursor);
        composed.insert_at_cursor(&insert.text);
        trace!(
            target: "line.overlay",
            replace = insert.replace,
            inserted = insert.text.chars().count(),
            "virtual_compose"
        );
        *self = LineState::Previewing {
            line,
            preview: Preview { insert, composed },
        };
    }

    /// Promote the composed line. Returns false when nothing was previewed.
    pub fn accept_virtual(&mut self) -> bool {
        match std::mem::take(self) {
            LineState::Previewing { preview, .. } => {
                trace!(target: "line.overlay", "accept_virtual");
                *self = LineState::Committed(preview.composed);
                true
            }
            committed => {
                *self = committed;
                false
            }
        }
    }

    /// Discard the composed line. Returns false when nothing was previewed.
    pub fn drop_virtual(&mut self) -> bool {
        match std::mem::take(self) {
            LineState::Previewing { line, .. } => {
                trace!(target: "line.overlay", "drop_virtual");
                *self = LineState::Committed(line);
                true
            }
            committed => {
                *self = committed;
                false
            }
        }
    }

    /// Replace the committed line wholesale (history navigation, reset).
    pub fn replace(&mut self, line: Line) {
        *self = LineState::Committed(line);
    }
}
