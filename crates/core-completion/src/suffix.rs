//! No-space suffix matching.
//!
//! Some candidates end in a delimiter (`dir/`, `--opt=`) after which no space
//! should follow. Accepting such a candidate arms a `PendingSuffix`; the next
//! keystroke either closes the word (space or a matcher character, which
//! replaces the delimiter) or leaves it alone.

use core_text::Line;
use smallvec::SmallVec;

/// Set of suffix characters, optionally with a `*` wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuffixMatcher {
    chars: SmallVec<[char; 4]>,
    wildcard: bool,
}

impl SuffixMatcher {
    /// Builds a matcher from a character list; `*` means any character.
    pub fn new(spec: &str) -> Self {
        let mut matcher = Self::default();
        for c in spec.chars() {
            if c == '*' {
                matcher.wildcard = true;
            } else if !matcher.chars.contains(&c) {
                matcher.chars.push(c);
            }
        }
        matcher
    }

    pub fn wildcard() -> Self {
        Self {
            chars: SmallVec::new(),
            wildcard: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty() && !self.wildcard
    }

    pub fn matches(&self, c: char) -> bool {
        self.wildcard || self.chars.contains(&c)
    }

    // A wildcard only closes on the delimiter itself, otherwise every
    // keystroke would eat it.
    fn closes_on(&self, key: char, delimiter: char) -> bool {
        key == ' ' || self.chars.contains(&key) || (self.wildcard && key == delimiter)
    }
}

/// Armed suffix waiting for the keystroke that follows an accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSuffix {
    matcher: SuffixMatcher,
    /// Cursor position right after the inserted candidate.
    pos: usize,
    delimiter: char,
}

impl PendingSuffix {
    /// Arms when `inserted` is longer than one character and ends with a
    /// matcher character.
    pub fn arm(matcher: &SuffixMatcher, inserted: &str, pos: usize) -> Option<Self> {
        if inserted.chars().count() <= 1 {
            return None;
        }
        let delimiter = inserted.chars().last()?;
        matcher.matches(delimiter).then(|| Self {
            matcher: matcher.clone(),
            pos,
            delimiter,
        })
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Whether `key` should remove the delimiter before being handled.
    pub fn closes(&self, line: &Line, key: &str) -> bool {
        if line.cursor() != self.pos || self.pos == 0 {
            return false;
        }
        if line.char_at(self.pos - 1) != Some(self.delimiter) {
            return false;
        }
        let mut chars = key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.matcher.closes_on(c, self.delimiter),
            _ => false,
        }
    }

    /// Removes the delimiter if `key` closes the word. Returns whether it did.
    pub fn apply(&self, line: &mut Line, key: &str) -> bool {
        if !self.closes(line, key) {
            return false;
        }
        line.delete(self.pos - 1..self.pos);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chars_and_wildcard() {
        let m = SuffixMatcher::new("/,*");
        assert!(m.matches('/'));
        assert!(m.matches('x'));
        assert!(!SuffixMatcher::new("/").matches('x'));
        assert!(SuffixMatcher::default().is_empty());
    }

    #[test]
    fn arms_only_on_multichar_insert_with_delimiter() {
        let m = SuffixMatcher::new("/");
        assert!(PendingSuffix::arm(&m, "/", 1).is_none());
        assert!(PendingSuffix::arm(&m, "src", 3).is_none());
        let armed = PendingSuffix::arm(&m, "src/", 4).unwrap();
        assert_eq!(armed.delimiter(), '/');
        assert_eq!(armed.position(), 4);
    }

    #[test]
    fn space_or_matcher_char_trims_delimiter() {
        let m = SuffixMatcher::new("/");
        let armed = PendingSuffix::arm(&m, "src/", 4).unwrap();

        let mut line = Line::from("src/");
        assert!(armed.apply(&mut line, " "));
        assert_eq!(line.to_string(), "src");

        let mut line = Line::from("src/");
        assert!(armed.apply(&mut line, "/"));
        assert_eq!(line.to_string(), "src");

        let mut line = Line::from("src/");
        assert!(!armed.apply(&mut line, "m"));
        assert_eq!(line.to_string(), "src/");
    }

    #[test]
    fn moved_cursor_disarms() {
        let m = SuffixMatcher::new("/");
        let armed = PendingSuffix::arm(&m, "src/", 4).unwrap();
        let mut line = Line::with_cursor("src/", 2);
        assert!(!armed.apply(&mut line, " "));
        assert_eq!(line.to_string(), "src/");
    }

    #[test]
    fn wildcard_closes_only_on_space_or_same_delimiter() {
        let armed = PendingSuffix::arm(&SuffixMatcher::wildcard(), "--opt=", 6).unwrap();
        let line = Line::from("--opt=");
        assert!(armed.closes(&line, " "));
        assert!(armed.closes(&line, "="));
        assert!(!armed.closes(&line, "v"));
    }
}
