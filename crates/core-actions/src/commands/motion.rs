//! Cursor motions.
//!
//! `target` is shared by plain motion commands and by operator replay: an
//! operator asks where the motion would land and spans the text between.

use crate::Builtin;
use core_text::motion::{
    Tokenizer, backward_word, emacs_forward_word, forward_word, forward_word_end, line_end,
    line_start,
};
use std::ops::Range;

/// Where `count` repetitions of motion `b` from `pos` land. `None` when `b`
/// is not a motion.
pub fn target(b: Builtin, chars: &[char], pos: usize, count: usize) -> Option<usize> {
    let step = |p: usize| -> Option<usize> {
        Some(match b {
            Builtin::ForwardChar => (p + 1).min(chars.len()),
            Builtin::BackwardChar => p.saturating_sub(1),
            Builtin::BeginningOfLine | Builtin::ViDigitOrBeginningOfLine => line_start(chars, p),
            Builtin::EndOfLine => line_end(chars, p),
            Builtin::ForwardWord => forward_word(chars, p, Tokenizer::Word),
            Builtin::BackwardWord => backward_word(chars, p, Tokenizer::Word),
            Builtin::EmacsForwardWord => emacs_forward_word(chars, p),
            Builtin::ForwardWordEnd => forward_word_end(chars, p, Tokenizer::Word),
            Builtin::ForwardBlankWord => forward_word(chars, p, Tokenizer::Blank),
            Builtin::BackwardBlankWord => backward_word(chars, p, Tokenizer::Blank),
            Builtin::ForwardShellWord => forward_word(chars, p, Tokenizer::Shell),
            Builtin::BackwardShellWord => backward_word(chars, p, Tokenizer::Shell),
            _ => return None,
        })
    };
    let mut pos = pos.min(chars.len());
    for _ in 0..count.max(1) {
        let next = step(pos)?;
        if next == pos {
            break;
        }
        pos = next;
    }
    Some(pos)
}

/// Motions whose landing character belongs to the operated span (Vi `e`).
pub fn is_inclusive(b: Builtin) -> bool {
    matches!(b, Builtin::ForwardWordEnd)
}

/// Text spanned by `count` repetitions of motion `b` from `pos`, in
/// ascending order and clamped to the line.
pub fn span(b: Builtin, chars: &[char], pos: usize, count: usize) -> Option<Range<usize>> {
    let to = target(b, chars, pos, count)?;
    let pos = pos.min(chars.len());
    let range = if to >= pos {
        let end = if is_inclusive(b) { to + 1 } else { to };
        pos..end.min(chars.len())
    } else {
        to..pos
    };
    Some(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cs(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn counted_word_motion() {
        let text = cs("one two three four");
        assert_eq!(target(Builtin::ForwardWord, &text, 0, 2), Some(8));
        assert_eq!(target(Builtin::BackwardWord, &text, 18, 1), Some(14));
    }

    #[test]
    fn non_motion_has_no_target() {
        assert_eq!(target(Builtin::Yank, &cs("x"), 0, 1), None);
    }

    #[test]
    fn spans_are_ascending_and_inclusive_for_word_end() {
        let text = cs("hello world");
        assert_eq!(span(Builtin::ForwardWord, &text, 0, 1), Some(0..6));
        assert_eq!(span(Builtin::ForwardWordEnd, &text, 0, 1), Some(0..5));
        assert_eq!(span(Builtin::BackwardWord, &text, 8, 1), Some(6..8));
        assert_eq!(span(Builtin::EndOfLine, &text, 6, 1), Some(6..11));
    }

    #[test]
    fn row_motions_stop_at_newlines() {
        let text = cs("ab\ncd");
        assert_eq!(target(Builtin::BeginningOfLine, &text, 4, 1), Some(3));
        assert_eq!(target(Builtin::EndOfLine, &text, 0, 3), Some(2));
    }
}
