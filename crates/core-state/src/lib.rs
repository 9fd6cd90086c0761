//! Per-session editing state: the line, keymap modes, pending operators,
//! registers, numeric argument, completion engine and undo history.
//!
//! Commands receive the pieces they need from a `Session` explicitly; the
//! session itself only offers small helpers that keep related fields
//! consistent (leaving a local keymap also tears down what it owned).
//!
//! Undo:
//! - The dispatcher captures an `EditSnapshot` of the committed line before
//!   a command and records it only if the line's revision moved.
//! - Consecutive self-inserts coalesce into one snapshot; any other command
//!   closes the run.
//! - Edits to the isearch pattern are not recorded.

use core_completion::{CompletionEngine, CompletionOptions, IsearchFilter};
use core_keymap::{CommandId, LocalKeymap, MainKeymap};
use core_text::{Line, LineState};
use tracing::debug;

pub mod undo;
use undo::UndoEngine;
pub use undo::{EditSnapshot, InsertRun, UNDO_HISTORY_MAX};

/// Largest numeric argument; further digits are ignored.
pub const MAX_COUNT: usize = 9999;

/// How a dispatch loop ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `accept-line` with the committed text.
    Accepted(String),
    /// `C-c` with no local keymap active.
    Interrupted,
    /// `C-d` on an empty line.
    Eof,
}

/// Operator waiting for a motion (`d` in `dw`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOperator {
    pub command: CommandId,
    pub count: usize,
}

/// Unnamed register plus a numbered ring of earlier kills, newest first.
#[derive(Debug, Default, Clone)]
pub struct Registers {
    pub unnamed: String,
    numbered: Vec<String>,
}

impl Registers {
    pub const MAX: usize = 10;

    pub fn new() -> Self {
        Self::default()
    }

    /// Store killed or yanked text. Empty text leaves the registers alone.
    pub fn record<S: Into<String>>(&mut self, text: S) {
        let s = text.into();
        if s.is_empty() {
            return;
        }
        self.unnamed = s.clone();
        if self.numbered.len() == Self::MAX {
            self.numbered.pop();
        }
        self.numbered.insert(0, s);
    }

    pub fn numbered(&self) -> &[String] {
        &self.numbered
    }
}

/// Knobs a host sets when creating a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub main: MainKeymap,
    pub completion: CompletionOptions,
    pub smart_case: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            main: MainKeymap::Emacs,
            completion: CompletionOptions::default(),
            smart_case: true,
        }
    }
}

#[derive(Debug)]
pub struct Session {
    pub line: LineState,
    pub main: MainKeymap,
    pub local: Option<LocalKeymap>,
    pub completion: CompletionEngine,
    pub isearch: Option<IsearchFilter>,
    pub operators: Vec<PendingOperator>,
    /// Anchor of the Vi visual selection.
    pub visual_anchor: Option<usize>,
    pub registers: Registers,
    /// Numeric argument being typed.
    pub count: Option<usize>,
    pub hint: Option<String>,
    pub outcome: Option<Outcome>,
    pub smart_case: bool,
    undo: UndoEngine,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            line: LineState::default(),
            main: options.main,
            local: None,
            completion: CompletionEngine::new(options.completion),
            isearch: None,
            operators: Vec::new(),
            visual_anchor: None,
            registers: Registers::new(),
            count: None,
            hint: None,
            outcome: None,
            smart_case: options.smart_case,
            undo: UndoEngine::new(),
        }
    }

    /// The committed line.
    pub fn line(&self) -> &Line {
        self.line.line()
    }

    /// Line the editing commands act on: the isearch pattern while searching,
    /// otherwise the committed line (dropping any preview).
    pub fn edit_target(&mut self) -> &mut Line {
        match self.isearch.as_mut() {
            Some(filter) => filter.buffer_mut(),
            None => self.line.line_mut(),
        }
    }

    /// `edit_target` together with the registers, for kills and puts.
    pub fn edit_parts(&mut self) -> (&mut Line, &mut Registers) {
        let target = match self.isearch.as_mut() {
            Some(filter) => filter.buffer_mut(),
            None => self.line.line_mut(),
        };
        (target, &mut self.registers)
    }

    pub fn set_main(&mut self, main: MainKeymap) {
        if self.main != main {
            debug!(target: "input.dispatch", from = ?self.main, to = ?main, "main_keymap");
            self.main = main;
        }
    }

    pub fn set_local(&mut self, local: Option<LocalKeymap>) {
        if self.local != local {
            debug!(target: "input.dispatch", from = ?self.local, to = ?local, "local_keymap");
            self.local = local;
        }
    }

    /// Leave the active local keymap, undoing whatever it had in flight:
    /// the menu and its preview, the search, pending operators or the
    /// visual selection.
    pub fn cancel_local(&mut self) {
        match self.local {
            Some(LocalKeymap::MenuSelect) | Some(LocalKeymap::Isearch) => {
                self.isearch = None;
                self.completion.reset(&mut self.line);
            }
            Some(LocalKeymap::ViOpp) => {
                self.operators.clear();
                self.count = None;
            }
            Some(LocalKeymap::Visual) => self.visual_anchor = None,
            None => {}
        }
        self.set_local(None);
    }

    /// Append a digit to the numeric argument, capped at `MAX_COUNT`.
    pub fn push_digit(&mut self, digit: u32) {
        let cur = self.count.unwrap_or(0);
        let next = cur.saturating_mul(10).saturating_add(digit as usize);
        self.count = Some(next.min(MAX_COUNT));
    }

    /// Consume the numeric argument, defaulting to 1.
    pub fn take_count(&mut self) -> usize {
        self.count.take().unwrap_or(1).max(1)
    }

    /// Message for the host: explicit hints first, then a rejected search
    /// pattern, then the completion engine's.
    pub fn hint(&self) -> Option<&str> {
        self.hint
            .as_deref()
            .or_else(|| self.isearch.as_ref().and_then(IsearchFilter::error))
            .or_else(|| self.completion.hint())
    }

    /// Record `before` as an undo step if the committed line changed since.
    /// `coalesce` folds consecutive self-inserts into one step.
    pub fn record_edit(&mut self, before: EditSnapshot, revision_before: u64, coalesce: bool) {
        if self.line.line().revision() == revision_before {
            return;
        }
        if coalesce {
            self.undo.note_insert(before);
        } else {
            self.undo.end_insert_run();
            self.undo.push_snapshot(before);
        }
    }

    pub fn end_insert_run(&mut self) {
        self.undo.end_insert_run();
    }

    pub fn undo(&mut self) -> bool {
        self.undo.undo(self.line.line_mut())
    }

    pub fn redo(&mut self) -> bool {
        self.undo.redo(self.line.line_mut())
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.undo.redo_depth()
    }

    /// Start a fresh line, keeping modes, registers and options.
    pub fn reset_line(&mut self) {
        self.cancel_local();
        self.completion.reset(&mut self.line);
        self.line.replace(Line::new());
        self.undo.clear();
        self.operators.clear();
        self.count = None;
        self.hint = None;
        self.outcome = None;
        self.visual_anchor = None;
    }
}
