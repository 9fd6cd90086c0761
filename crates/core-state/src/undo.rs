use core_text::Line;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::trace;

/// Maximum number of snapshots retained in undo history.
pub const UNDO_HISTORY_MAX: usize = 100;

/// Committed text and cursor captured before an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSnapshot {
    pub text: String,
    pub cursor: usize,
    /// Hash of `text` and `cursor`, logged with each push.
    pub hash: u64,
}

impl EditSnapshot {
    pub fn capture(line: &Line) -> Self {
        let text = line.to_string();
        let cursor = line.cursor();
        Self {
            hash: snapshot_hash(&text, cursor),
            text,
            cursor,
        }
    }

    // Writes through `set` so the live line's revision keeps increasing.
    fn restore(self, line: &mut Line) {
        line.set(&self.text);
        line.set_cursor(self.cursor);
    }
}

/// Self-insert run tracking. A run is undone as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertRun {
    Inactive,
    Active { edits: u32 },
}

#[derive(Debug)]
pub struct UndoEngine {
    undo_stack: Vec<EditSnapshot>,
    redo_stack: Vec<EditSnapshot>,
    insert_run: InsertRun,
    snapshots_skipped: u64,
}

impl Default for UndoEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoEngine {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            insert_run: InsertRun::Inactive,
            snapshots_skipped: 0,
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
    pub fn insert_run(&self) -> InsertRun {
        self.insert_run
    }
    pub fn snapshots_skipped(&self) -> u64 {
        self.snapshots_skipped
    }

    /// Record the pre-edit state. Identical successive snapshots are skipped;
    /// any new edit invalidates the redo history.
    pub fn push_snapshot(&mut self, snap: EditSnapshot) {
        if let Some(last) = self.undo_stack.last()
            && *last == snap
        {
            self.snapshots_skipped += 1;
            trace!(target: "state.undo", undo_depth = self.undo_stack.len(), hash = snap.hash, "snapshot_dedupe_skip");
        } else {
            let hash = snap.hash;
            self.undo_stack.push(snap);
            trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), hash, "push_snapshot");
            if self.undo_stack.len() > UNDO_HISTORY_MAX {
                self.undo_stack.remove(0);
                trace!(target: "state.undo", "undo_stack_trimmed");
            }
        }
        if !self.redo_stack.is_empty() {
            self.redo_stack.clear();
            trace!(target: "state.undo", "redo_stack_cleared_on_new_edit");
        }
    }

    /// Record a self-insert. Only the first insert of a run pushes a snapshot.
    pub fn note_insert(&mut self, before: EditSnapshot) {
        match &mut self.insert_run {
            InsertRun::Inactive => {
                self.push_snapshot(before);
                self.insert_run = InsertRun::Active { edits: 1 };
            }
            InsertRun::Active { edits } => {
                *edits += 1;
                self.redo_stack.clear();
            }
        }
    }

    pub fn end_insert_run(&mut self) {
        if self.insert_run != InsertRun::Inactive {
            trace!(target: "state.undo", run = ?self.insert_run, "insert_run_closed");
        }
        self.insert_run = InsertRun::Inactive;
    }

    pub fn undo(&mut self, line: &mut Line) -> bool {
        self.end_insert_run();
        let Some(last) = self.undo_stack.pop() else {
            return false;
        };
        trace!(target: "state.undo", undo_depth = self.undo_stack.len(), redo_depth = self.redo_stack.len(), "undo_pop");
        self.redo_stack.push(EditSnapshot::capture(line));
        last.restore(line);
        true
    }

    pub fn redo(&mut self, line: &mut Line) -> bool {
        self.end_insert_run();
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        trace!(target: "state.undo", redo_depth = self.redo_stack.len(), undo_depth = self.undo_stack.len(), "redo_pop");
        self.undo_stack.push(EditSnapshot::capture(line));
        next.restore(line);
        true
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.insert_run = InsertRun::Inactive;
    }
}

fn snapshot_hash(text: &str, cursor: usize) -> u64 {
    let mut h = DefaultHasher::new();
    text.hash(&mut h);
    cursor.hash(&mut h);
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_restores_text_and_cursor_then_redo_reapplies() {
        let mut undo = UndoEngine::new();
        let mut line = Line::with_cursor("abc", 1);
        undo.push_snapshot(EditSnapshot::capture(&line));
        line.insert_at_cursor("X");
        assert!(undo.undo(&mut line));
        assert_eq!(line.to_string(), "abc");
        assert_eq!(line.cursor(), 1);
        assert!(undo.redo(&mut line));
        assert_eq!(line.to_string(), "aXbc");
        assert!(!undo.redo(&mut line));
    }

    #[test]
    fn identical_snapshots_are_skipped() {
        let mut undo = UndoEngine::new();
        let line = Line::from("same");
        undo.push_snapshot(EditSnapshot::capture(&line));
        undo.push_snapshot(EditSnapshot::capture(&line));
        assert_eq!(undo.undo_depth(), 1);
        assert_eq!(undo.snapshots_skipped(), 1);
    }

    #[test]
    fn same_text_with_moved_cursor_is_kept() {
        let mut undo = UndoEngine::new();
        let mut line = Line::with_cursor("same", 0);
        undo.push_snapshot(EditSnapshot::capture(&line));
        line.set_cursor(4);
        undo.push_snapshot(EditSnapshot::capture(&line));
        assert_eq!(undo.undo_depth(), 2);
        assert_eq!(undo.snapshots_skipped(), 0);

        line.insert_at_cursor("!");
        undo.undo(&mut line);
        assert_eq!(line.to_string(), "same");
        assert_eq!(line.cursor(), 4);
        undo.undo(&mut line);
        assert_eq!(line.cursor(), 0);
    }

    #[test]
    fn insert_run_coalesces_until_closed() {
        let mut undo = UndoEngine::new();
        let mut line = Line::new();
        for c in ["a", "b", "c"] {
            undo.note_insert(EditSnapshot::capture(&line));
            line.insert_at_cursor(c);
        }
        assert_eq!(undo.undo_depth(), 1);
        assert_eq!(undo.insert_run(), InsertRun::Active { edits: 3 });
        undo.end_insert_run();
        undo.note_insert(EditSnapshot::capture(&line));
        line.insert_at_cursor("d");
        assert_eq!(undo.undo_depth(), 2);
        undo.undo(&mut line);
        assert_eq!(line.to_string(), "abc");
        undo.undo(&mut line);
        assert_eq!(line.to_string(), "");
    }

    #[test]
    fn history_is_capped() {
        let mut undo = UndoEngine::new();
        let mut line = Line::new();
        for i in 0..(UNDO_HISTORY_MAX + 20) {
            undo.push_snapshot(EditSnapshot::capture(&line));
            line.set(&i.to_string());
        }
        assert_eq!(undo.undo_depth(), UNDO_HISTORY_MAX);
    }

    #[test]
    fn undo_keeps_revision_increasing() {
        let mut undo = UndoEngine::new();
        let mut line = Line::new();
        undo.push_snapshot(EditSnapshot::capture(&line));
        line.insert_at_cursor("x");
        let before = line.revision();
        undo.undo(&mut line);
        assert!(line.revision() > before);
    }
}
