//! Inputrc-like key notation and well-known decoded sequences.
//!
//! Configuration files write `\C-a`, `\M-f`, `\e[A` or `<up>`; the dispatch
//! engine only ever sees decoded strings (`"\x01"`, `"\x1bf"`, `"\x1b[A"`).

use thiserror::Error;

pub const ESC: &str = "\x1b";
pub const TAB: &str = "\t";
pub const BACKTAB: &str = "\x1b[Z";
pub const ENTER: &str = "\r";
pub const NEWLINE: &str = "\n";
pub const BACKSPACE: &str = "\x7f";
pub const UP: &str = "\x1b[A";
pub const DOWN: &str = "\x1b[B";
pub const RIGHT: &str = "\x1b[C";
pub const LEFT: &str = "\x1b[D";
pub const HOME: &str = "\x1b[H";
pub const END: &str = "\x1b[F";
pub const DELETE: &str = "\x1b[3~";
pub const PAGE_UP: &str = "\x1b[5~";
pub const PAGE_DOWN: &str = "\x1b[6~";

const NAMED: &[(&str, &str)] = &[
    ("esc", ESC),
    ("tab", TAB),
    ("backtab", BACKTAB),
    ("enter", ENTER),
    ("backspace", BACKSPACE),
    ("up", UP),
    ("down", DOWN),
    ("right", RIGHT),
    ("left", LEFT),
    ("home", HOME),
    ("end", END),
    ("delete", DELETE),
    ("pgup", PAGE_UP),
    ("pgdn", PAGE_DOWN),
    ("space", " "),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyNotationError {
    #[error("empty key sequence")]
    Empty,
    #[error("trailing backslash in key notation `{0}`")]
    TrailingEscape(String),
    #[error("unknown escape `\\{escape}` in key notation `{input}`")]
    UnknownEscape { input: String, escape: char },
    #[error("control modifier needs an ASCII character in `{0}`")]
    InvalidControl(String),
}

/// Control character for `c` (`ctrl('a') == "\x01"`, `ctrl('?') == "\x7f"`).
pub fn ctrl(c: char) -> Option<char> {
    match c {
        '?' => Some('\x7f'),
        c if c.is_ascii() => Some(((c.to_ascii_uppercase() as u8) & 0x1f) as char),
        _ => None,
    }
}

/// Meta-prefixed sequence (`meta("f") == "\x1bf"`).
pub fn meta(seq: &str) -> String {
    format!("{ESC}{seq}")
}

/// Parse inputrc-like notation into the decoded key-sequence string.
pub fn parse_notation(input: &str) -> Result<String, KeyNotationError> {
    if input.is_empty() {
        return Err(KeyNotationError::Empty);
    }
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        i = parse_unit(input, &chars, i, &mut out)?;
    }
    Ok(out)
}

// Parses one key starting at `i`, appends it to `out`, returns the next index.
fn parse_unit(
    input: &str,
    chars: &[char],
    i: usize,
    out: &mut String,
) -> Result<usize, KeyNotationError> {
    match chars[i] {
        '\\' => {
            let Some(&esc) = chars.get(i + 1) else {
                return Err(KeyNotationError::TrailingEscape(input.to_string()));
            };
            match esc {
                'C' if chars.get(i + 2) == Some(&'-') => {
                    let mut inner = String::new();
                    if i + 3 >= chars.len() {
                        return Err(KeyNotationError::InvalidControl(input.to_string()));
                    }
                    let next = parse_unit(input, chars, i + 3, &mut inner)?;
                    let mut it = inner.chars();
                    let (Some(c), None) = (it.next(), it.next()) else {
                        return Err(KeyNotationError::InvalidControl(input.to_string()));
                    };
                    let ctl = ctrl(c).ok_or_else(|| KeyNotationError::InvalidControl(input.to_string()))?;
                    out.push(ctl);
                    Ok(next)
                }
                'M' if chars.get(i + 2) == Some(&'-') => {
                    if i + 3 >= chars.len() {
                        return Err(KeyNotationError::TrailingEscape(input.to_string()));
                    }
                    out.push_str(ESC);
                    parse_unit(input, chars, i + 3, out)
                }
                'e' => {
                    out.push_str(ESC);
                    Ok(i + 2)
                }
                't' => {
                    out.push('\t');
                    Ok(i + 2)
                }
                'r' => {
                    out.push('\r');
                    Ok(i + 2)
                }
                'n' => {
                    out.push('\n');
                    Ok(i + 2)
                }
                '\\' | '"' | '\'' | '<' => {
                    out.push(esc);
                    Ok(i + 2)
                }
                other => Err(KeyNotationError::UnknownEscape {
                    input: input.to_string(),
                    escape: other,
                }),
            }
        }
        '<' => {
            if let Some(close) = chars[i + 1..].iter().position(|c| *c == '>') {
                let name: String = chars[i + 1..i + 1 + close].iter().collect();
                let lowered = name.to_ascii_lowercase();
                if let Some((_, seq)) = NAMED.iter().find(|(n, _)| *n == lowered) {
                    out.push_str(seq);
                    return Ok(i + close + 2);
                }
            }
            out.push('<');
            Ok(i + 1)
        }
        c => {
            out.push(c);
            Ok(i + 1)
        }
    }
}

/// Human-readable rendering of a decoded sequence, for logs and hints.
pub fn describe(seq: &str) -> String {
    for (name, named) in NAMED {
        if *named == seq && seq.len() > 1 {
            return format!("<{name}>");
        }
    }
    let mut out = String::new();
    for c in seq.chars() {
        match c {
            '\x1b' => out.push_str("\\e"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\x7f' => out.push_str("\\C-?"),
            c if (c as u32) < 0x20 => {
                out.push_str("\\C-");
                out.push(((c as u8) | 0x60) as char);
            }
            c => out.push(c),
        }
    }
    out
}
