//! Keymap switches: Vi insert/command mode, visual selection, abort.

use super::edit::clamp_to_row;
use super::operator::{self, OperatorKind};
use core_keymap::{LocalKeymap, MainKeymap};
use core_state::Session;
use core_text::motion::{line_end, line_start};
use tracing::debug;

/// Where the cursor goes when entering Vi insert mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    Cursor,
    /// `a`: after the character under the cursor.
    After,
    /// `A`
    Eol,
    /// `I`
    Bol,
}

/// `ESC` in Vi insert: the cursor steps back onto the last inserted
/// character and any listing closes.
pub fn vi_command(s: &mut Session) {
    s.completion.reset(&mut s.line);
    s.set_main(MainKeymap::ViCommand);
    let line = s.line.line_mut();
    let cur = line.cursor();
    if cur > line_start(line.chars(), cur) {
        line.move_by(-1);
    }
    clamp_to_row(line);
}

pub fn vi_insert(s: &mut Session, at: InsertAt) {
    let line = s.line.line_mut();
    let cur = line.cursor();
    let to = match at {
        InsertAt::Cursor => cur,
        InsertAt::After => (cur + 1).min(line_end(line.chars(), cur)),
        InsertAt::Eol => line_end(line.chars(), cur),
        InsertAt::Bol => line_start(line.chars(), cur),
    };
    line.set_cursor(to);
    s.set_main(MainKeymap::ViInsert);
}

pub fn visual_start(s: &mut Session) {
    s.visual_anchor = Some(s.line().cursor());
    s.set_local(Some(LocalKeymap::Visual));
}

/// Apply an operator to the visual selection, which includes both the
/// anchor and the cursor character.
pub fn visual_apply(s: &mut Session, kind: OperatorKind) {
    let Some(anchor) = s.visual_anchor.take() else {
        s.set_local(None);
        return;
    };
    let line = s.line.line_mut();
    let cur = line.cursor();
    let range = anchor.min(cur)..(anchor.max(cur) + 1).min(line.len());
    operator::apply(kind, line, &mut s.registers, range);
    s.set_local(None);
    if kind.enters_insert() {
        s.set_main(MainKeymap::ViInsert);
    } else {
        clamp_to_row(s.line.line_mut());
    }
}

/// Drop everything in flight: numeric argument, local keymap, listing.
pub fn abort(s: &mut Session) {
    debug!(target: "input.dispatch", local = ?s.local, "abort");
    s.count = None;
    s.cancel_local();
    s.completion.reset(&mut s.line);
}
