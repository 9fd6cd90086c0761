//! Text edits over a single `Line`.
//!
//! Kills write the removed text to the registers; yanks and puts read the
//! unnamed register back.

use core_state::Registers;
use core_text::Line;
use core_text::motion::{Tokenizer, backward_word, emacs_forward_word, line_end, line_start};
use std::ops::Range;
use tracing::trace;

pub fn self_insert(line: &mut Line, text: &str, count: usize) {
    for _ in 0..count.max(1) {
        line.insert_at_cursor(text);
    }
}

pub fn backward_delete_char(line: &mut Line, count: usize) {
    let cur = line.cursor();
    line.delete(cur.saturating_sub(count.max(1))..cur);
}

pub fn delete_char(line: &mut Line, count: usize) {
    let cur = line.cursor();
    line.delete(cur..cur.saturating_add(count.max(1)));
}

fn kill(line: &mut Line, registers: &mut Registers, range: Range<usize>) {
    let removed = line.delete(range);
    trace!(target: "input.dispatch", killed = removed.chars().count(), "kill");
    registers.record(removed);
}

pub fn kill_line(line: &mut Line, registers: &mut Registers) {
    let cur = line.cursor();
    let end = line_end(line.chars(), cur);
    kill(line, registers, cur..end);
}

pub fn backward_kill_line(line: &mut Line, registers: &mut Registers) {
    let cur = line.cursor();
    let start = line_start(line.chars(), cur);
    kill(line, registers, start..cur);
}

pub fn kill_word(line: &mut Line, registers: &mut Registers, count: usize) {
    let cur = line.cursor();
    let mut end = cur;
    for _ in 0..count.max(1) {
        end = emacs_forward_word(line.chars(), end);
    }
    kill(line, registers, cur..end);
}

fn kill_backward(line: &mut Line, registers: &mut Registers, tok: Tokenizer, count: usize) {
    let cur = line.cursor();
    let mut start = cur;
    for _ in 0..count.max(1) {
        start = backward_word(line.chars(), start, tok);
    }
    kill(line, registers, start..cur);
}

pub fn backward_kill_word(line: &mut Line, registers: &mut Registers, count: usize) {
    kill_backward(line, registers, Tokenizer::Word, count);
}

/// `C-w`: kills back to the previous blank, not the previous punctuation.
pub fn unix_word_rubout(line: &mut Line, registers: &mut Registers, count: usize) {
    kill_backward(line, registers, Tokenizer::Blank, count);
}

pub fn yank(line: &mut Line, registers: &Registers, count: usize) {
    if registers.unnamed.is_empty() {
        return;
    }
    self_insert(line, &registers.unnamed, count);
}

/// Swap the characters around the cursor and step forward; at the end of
/// the line, swap the last two.
pub fn transpose_chars(line: &mut Line) {
    let len = line.len();
    let cur = line.cursor();
    if len < 2 || cur == 0 {
        return;
    }
    let at = if cur >= len { len - 1 } else { cur };
    let moved = line.delete(at - 1..at);
    line.insert(at, &moved);
    line.set_cursor(at + 1);
}

pub fn clear_line(line: &mut Line) {
    line.clear();
}

/// Vi `x`: delete under the cursor without crossing the end of the row.
pub fn vi_delete_char(line: &mut Line, registers: &mut Registers, count: usize) {
    let cur = line.cursor();
    let end = line_end(line.chars(), cur).min(cur.saturating_add(count.max(1)));
    kill(line, registers, cur..end);
    clamp_to_row(line);
}

/// Vi `p` / `P`: insert the unnamed register after or at the cursor; the
/// cursor rests on the last inserted character.
pub fn vi_put(line: &mut Line, registers: &Registers, after: bool, count: usize) {
    if registers.unnamed.is_empty() {
        return;
    }
    let cur = line.cursor();
    let at = if after && cur < line_end(line.chars(), cur) {
        cur + 1
    } else {
        cur
    };
    line.set_cursor(at);
    self_insert(line, &registers.unnamed, count);
    line.move_by(-1);
}

/// Vi command mode keeps the cursor on a character, not past the row end.
pub fn clamp_to_row(line: &mut Line) {
    let cur = line.cursor();
    let start = line_start(line.chars(), cur);
    let end = line_end(line.chars(), cur);
    if cur >= end && end > start {
        line.set_cursor(end - 1);
    }
}
