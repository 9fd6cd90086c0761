//! Cursor motion helpers over a code-point slice.
//!
//! Each logical motion has exactly one implementation, parameterised by a
//! `Tokenizer` that decides what a "word" is. Emacs and Vi bindings pick a
//! tokenizer instead of carrying their own copies of the motion.
//!
//! All functions are pure: they take the text and a position and return the
//! new position, clamped to `[0, len]`.

use std::ops::Range;

/// Word segmentation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tokenizer {
    /// Alphanumerics and `_` form words; other non-blank runs are punctuation words.
    Word,
    /// Any run of non-blank characters is a word.
    Blank,
    /// Blank-separated shell words; quoted spans and escaped blanks do not split.
    Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Blank,
    Word,
    Punct,
}

fn class(tok: Tokenizer, c: char) -> Class {
    if c.is_whitespace() {
        return Class::Blank;
    }
    match tok {
        Tokenizer::Word if c == '_' || c.is_alphanumeric() => Class::Word,
        Tokenizer::Word => Class::Punct,
        Tokenizer::Blank | Tokenizer::Shell => Class::Word,
    }
}

/// Alphanumeric-or-underscore test shared with Emacs word motions.
pub fn is_word_char(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Shell word spans: blanks split words unless quoted (`'`, `"`) or escaped.
pub fn shell_words(chars: &[char]) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, &c) in chars.iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\\' => {
                escaped = true;
                start.get_or_insert(i);
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                start.get_or_insert(i);
            }
            None if c.is_whitespace() => {
                if let Some(s) = start.take() {
                    spans.push(s..i);
                }
            }
            None => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(s) = start {
        spans.push(s..chars.len());
    }
    spans
}

/// Start of the next word (Vi `w`): skip the rest of the current word, then
/// any blanks.
pub fn forward_word(chars: &[char], pos: usize, tok: Tokenizer) -> usize {
    let len = chars.len();
    if pos >= len {
        return len;
    }
    if tok == Tokenizer::Shell {
        return shell_words(chars)
            .into_iter()
            .map(|r| r.start)
            .find(|s| *s > pos)
            .unwrap_or(len);
    }
    let mut p = pos;
    let start_class = class(tok, chars[p]);
    if start_class != Class::Blank {
        while p < len && class(tok, chars[p]) == start_class {
            p += 1;
        }
    }
    while p < len && class(tok, chars[p]) == Class::Blank {
        p += 1;
    }
    p
}

/// Start of the current or previous word (Vi `b`, Emacs `M-b`).
pub fn backward_word(chars: &[char], pos: usize, tok: Tokenizer) -> usize {
    let pos = pos.min(chars.len());
    if pos == 0 {
        return 0;
    }
    if tok == Tokenizer::Shell {
        return shell_words(chars)
            .into_iter()
            .map(|r| r.start)
            .filter(|s| *s < pos)
            .last()
            .unwrap_or(0);
    }
    let mut p = pos - 1;
    while p > 0 && class(tok, chars[p]) == Class::Blank {
        p -= 1;
    }
    let target = class(tok, chars[p]);
    if target == Class::Blank {
        return 0;
    }
    while p > 0 && class(tok, chars[p - 1]) == target {
        p -= 1;
    }
    p
}

/// Last character of the current or next word (Vi `e`). Inclusive position.
pub fn forward_word_end(chars: &[char], pos: usize, tok: Tokenizer) -> usize {
    let len = chars.len();
    if len == 0 {
        return 0;
    }
    if tok == Tokenizer::Shell {
        return shell_words(chars)
            .into_iter()
            .map(|r| r.end - 1)
            .find(|e| *e > pos)
            .unwrap_or(len - 1);
    }
    let mut p = pos + 1;
    while p < len && class(tok, chars[p]) == Class::Blank {
        p += 1;
    }
    if p >= len {
        return len - 1;
    }
    let target = class(tok, chars[p]);
    while p + 1 < len && class(tok, chars[p + 1]) == target {
        p += 1;
    }
    p
}

/// Emacs `M-f`: skip non-word characters, then the word; lands after it.
pub fn emacs_forward_word(chars: &[char], pos: usize) -> usize {
    let len = chars.len();
    let mut p = pos.min(len);
    while p < len && !is_word_char(chars[p]) {
        p += 1;
    }
    while p < len && is_word_char(chars[p]) {
        p += 1;
    }
    p
}

/// Start of the row containing `pos` (position after the previous newline).
pub fn line_start(chars: &[char], pos: usize) -> usize {
    let pos = pos.min(chars.len());
    chars[..pos]
        .iter()
        .rposition(|c| *c == '\n')
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// End of the row containing `pos` (position of the next newline, or len).
pub fn line_end(chars: &[char], pos: usize) -> usize {
    let pos = pos.min(chars.len());
    chars[pos..]
        .iter()
        .position(|c| *c == '\n')
        .map(|i| pos + i)
        .unwrap_or(chars.len())
}

/// Full row span including its trailing newline when present.
pub fn whole_line(chars: &[char], pos: usize) -> Range<usize> {
    let start = line_start(chars, pos);
    let end = line_end(chars, pos);
    let end = if end < chars.len() { end + 1 } else { end };
    start..end
}

/// Shell word ending at `pos` (the completion prefix). Empty when the cursor
/// follows a blank.
pub fn word_before(chars: &[char], pos: usize) -> Range<usize> {
    let pos = pos.min(chars.len());
    shell_words(&chars[..pos])
        .into_iter()
        .find(|r| r.end == pos)
        .unwrap_or(pos..pos)
}
