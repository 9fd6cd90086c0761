//! Vi operators (`d`, `c`, `y`) applied to a resolved span.

use crate::Builtin;
use core_state::Registers;
use core_text::Line;
use std::ops::Range;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    Delete,
    Change,
    Yank,
}

impl OperatorKind {
    pub fn from_builtin(b: Builtin) -> Option<Self> {
        match b {
            Builtin::DeleteMotion | Builtin::ViVisualDelete => Some(OperatorKind::Delete),
            Builtin::ChangeMotion | Builtin::ViVisualChange => Some(OperatorKind::Change),
            Builtin::YankMotion | Builtin::ViVisualYank => Some(OperatorKind::Yank),
            _ => None,
        }
    }

    /// Change leaves the editor in insert mode.
    pub fn enters_insert(self) -> bool {
        self == OperatorKind::Change
    }
}

/// Apply `kind` to `range` of `line`. The cursor ends at the span start.
pub fn apply(kind: OperatorKind, line: &mut Line, registers: &mut Registers, range: Range<usize>) {
    let start = range.start;
    match kind {
        OperatorKind::Delete | OperatorKind::Change => {
            let removed = line.delete(range);
            debug!(target: "input.operator", ?kind, removed = removed.chars().count(), "operator_applied");
            registers.record(removed);
        }
        OperatorKind::Yank => {
            let text = line.slice(range);
            debug!(target: "input.operator", ?kind, yanked = text.chars().count(), "operator_applied");
            registers.record(text);
        }
    }
    line.set_cursor(start);
}
