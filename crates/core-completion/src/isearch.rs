//! Incremental search over the completion listing.
//!
//! The search pattern is edited in its own `Line` with the ordinary editing
//! commands. Whenever that buffer's revision moves, the pattern is
//! recompiled and the engine's groups are re-derived from the generated set.
//! A pattern that fails to compile leaves the previous filter in place.

use core_text::{Line, LineState};
use regex::{Regex, RegexBuilder};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{Candidate, CompletionEngine, Geometry};

const BAD_PATTERN: &str = "failed to compile search regexp";

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid search pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug)]
pub struct IsearchFilter {
    buffer: Line,
    smart_case: bool,
    regex: Option<Regex>,
    seen_revision: Option<u64>,
    error: Option<String>,
}

impl IsearchFilter {
    pub fn new(smart_case: bool) -> Self {
        Self {
            buffer: Line::new(),
            smart_case,
            regex: None,
            seen_revision: None,
            error: None,
        }
    }

    pub fn buffer(&self) -> &Line {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut Line {
        &mut self.buffer
    }

    pub fn pattern(&self) -> String {
        self.buffer.to_string()
    }

    /// Filter currently in effect; `None` shows everything.
    pub fn regex(&self) -> Option<&Regex> {
        self.regex.as_ref()
    }

    /// Message for the last rejected pattern, if the current one is bad.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Compile `pattern`. Empty patterns filter nothing. With `smart_case`,
    /// matching ignores case unless the pattern has an uppercase letter.
    pub fn compile(pattern: &str, smart_case: bool) -> Result<Option<Regex>, FilterError> {
        if pattern.is_empty() {
            return Ok(None);
        }
        let ignore_case = smart_case && !pattern.chars().any(char::is_uppercase);
        RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map(Some)
            .map_err(|source| FilterError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Grid groups search values; list and map groups also search
    /// descriptions.
    pub fn matches(regex: &Regex, candidate: &Candidate, geometry: Geometry) -> bool {
        regex.is_match(&candidate.value)
            || (geometry != Geometry::Grid && regex.is_match(&candidate.description))
    }

    /// Re-filter `engine` if the pattern changed since the last call.
    /// Returns whether the listing was rebuilt.
    pub fn refresh(&mut self, engine: &mut CompletionEngine, line: &mut LineState) -> bool {
        let revision = self.buffer.revision();
        if self.seen_revision == Some(revision) {
            return false;
        }
        self.seen_revision = Some(revision);
        let pattern = self.pattern();
        match Self::compile(&pattern, self.smart_case) {
            Ok(regex) => {
                self.regex = regex;
                self.error = None;
                let active = self.regex.as_ref();
                engine.apply_filter(line, |c, g| active.is_none_or(|re| Self::matches(re, c, g)));
                debug!(target: "completion.isearch", %pattern, remaining = engine.total(), "refiltered");
                true
            }
            Err(err) => {
                warn!(target: "completion.isearch", error = %err, "pattern_rejected");
                self.error = Some(BAD_PATTERN.to_string());
                engine.set_hint(Some(BAD_PATTERN.to_string()));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompletionOptions, Completions};
    use pretty_assertions::assert_eq;

    fn values(engine: &CompletionEngine) -> Vec<String> {
        engine
            .groups()
            .iter()
            .flat_map(|g| g.candidates())
            .map(|c| c.value.clone())
            .collect()
    }

    fn setup(text: &str, candidates: &[&str]) -> (CompletionEngine, LineState) {
        let mut engine = CompletionEngine::new(CompletionOptions::default());
        let mut line = LineState::new(Line::from(text));
        engine.generate(Completions::from_values(candidates.iter().copied()), &mut line);
        (engine, line)
    }

    #[test]
    fn smart_case_lowercase_ignores_case() {
        let (mut engine, mut line) = setup("", &["FOO", "foo", "Foobar", "bar"]);
        let mut filter = IsearchFilter::new(true);
        filter.buffer_mut().insert_at_cursor("foo");
        assert!(filter.refresh(&mut engine, &mut line));
        assert_eq!(values(&engine), vec!["FOO", "foo", "Foobar"]);
    }

    #[test]
    fn smart_case_uppercase_is_exact() {
        let (mut engine, mut line) = setup("", &["FOO", "foo", "Foobar", "bar"]);
        let mut filter = IsearchFilter::new(true);
        filter.buffer_mut().insert_at_cursor("FOO");
        filter.refresh(&mut engine, &mut line);
        assert_eq!(values(&engine), vec!["FOO"]);
    }

    #[test]
    fn without_smart_case_matching_is_exact() {
        let (mut engine, mut line) = setup("", &["FOO", "foo"]);
        let mut filter = IsearchFilter::new(false);
        filter.buffer_mut().insert_at_cursor("foo");
        filter.refresh(&mut engine, &mut line);
        assert_eq!(values(&engine), vec!["foo"]);
    }

    #[test]
    fn narrowing_to_one_then_accepting() {
        let (mut engine, mut line) = setup("ap", &["apple", "apply"]);
        let mut filter = IsearchFilter::new(true);
        filter.buffer_mut().insert_at_cursor("e$");
        filter.refresh(&mut engine, &mut line);
        assert_eq!(values(&engine), vec!["apple"]);
        let accepted = engine.accept(&mut line).unwrap();
        assert!(accepted.finished);
        assert_eq!(line.line().to_string(), "apple");
    }

    #[test]
    fn invalid_pattern_keeps_last_filter() {
        let (mut engine, mut line) = setup("", &["a(b", "ab", "c"]);
        let mut filter = IsearchFilter::new(true);
        filter.buffer_mut().insert_at_cursor("a");
        filter.refresh(&mut engine, &mut line);
        assert_eq!(values(&engine), vec!["a(b", "ab"]);

        filter.buffer_mut().insert_at_cursor("(");
        assert!(!filter.refresh(&mut engine, &mut line));
        assert_eq!(filter.error(), Some("failed to compile search regexp"));
        assert_eq!(engine.hint(), Some("failed to compile search regexp"));
        assert_eq!(values(&engine), vec!["a(b", "ab"]);

        filter.buffer_mut().insert_at_cursor(")b");
        filter.refresh(&mut engine, &mut line);
        assert_eq!(filter.error(), None);
        assert_eq!(values(&engine), vec!["ab"]);
    }

    #[test]
    fn clearing_pattern_restores_everything() {
        let (mut engine, mut line) = setup("", &["x", "y"]);
        let mut filter = IsearchFilter::new(true);
        filter.buffer_mut().insert_at_cursor("x");
        filter.refresh(&mut engine, &mut line);
        assert_eq!(engine.total(), 1);
        filter.buffer_mut().clear();
        filter.refresh(&mut engine, &mut line);
        assert_eq!(engine.total(), 2);
    }

    #[test]
    fn unchanged_buffer_is_not_refiltered() {
        let (mut engine, mut line) = setup("", &["x", "y"]);
        let mut filter = IsearchFilter::new(true);
        filter.buffer_mut().insert_at_cursor("x");
        assert!(filter.refresh(&mut engine, &mut line));
        assert!(!filter.refresh(&mut engine, &mut line));
    }

    #[test]
    fn descriptions_match_outside_grid() {
        let candidates = [
            Candidate::new("-v").with_description("verbose output"),
            Candidate::new("-q").with_description("quiet"),
        ];
        let re = IsearchFilter::compile("verb", true).unwrap().unwrap();
        assert!(IsearchFilter::matches(&re, &candidates[0], Geometry::List));
        assert!(!IsearchFilter::matches(&re, &candidates[0], Geometry::Grid));
        assert!(!IsearchFilter::matches(&re, &candidates[1], Geometry::Map));
    }
}
