//! Completion engine: candidate groups, menu geometry, selection, and the
//! incremental search filter.
//!
//! The engine never runs on its own. Commands drive it (`generate`,
//! `select`, `accept`, `reset`) and hand it the `LineState` it may preview
//! candidates into; the engine itself owns no line.
//!
//! Candidates come from an external `Completer` as a flat, tagged bag. The
//! engine partitions them by tag into `Group`s, each laid out in one of three
//! geometries (see `group`). Filtering (isearch) derives new reduced groups
//! from the generated set; candidates are never mutated.

use std::collections::BTreeMap;

mod engine;
mod group;
pub mod isearch;
mod suffix;

pub use engine::{Accepted, CompletionEngine, CompletionOptions};
pub use group::{Group, GroupLayout};
pub use isearch::{FilterError, IsearchFilter};
pub use suffix::{PendingSuffix, SuffixMatcher};

/// Display geometry of a completion group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Geometry {
    /// Values laid out in as many equal-width columns as fit.
    #[default]
    Grid,
    /// One row per description; candidates sharing it become alias columns.
    List,
    /// One value/description pair per row.
    Map,
}

/// A single completion candidate. Immutable once generated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    /// Text inserted into the line.
    pub value: String,
    /// Text shown in the menu; falls back to `value` when empty.
    pub display: String,
    pub description: String,
    pub style: String,
    pub tag: String,
}

impl Candidate {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn display_text(&self) -> &str {
        if self.display.is_empty() {
            &self.value
        } else {
            &self.display
        }
    }
}

/// Per-tag display and insertion options supplied by the completer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagOptions {
    /// Geometry hint; when absent, groups with descriptions use `List`.
    pub geometry: Option<Geometry>,
    /// Visible rows before the group scrolls.
    pub max_rows: Option<usize>,
    /// Trailing characters that do not get a space and may be trimmed.
    pub no_space: SuffixMatcher,
}

/// Everything a completer returns for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completions {
    pub candidates: Vec<Candidate>,
    pub tags: BTreeMap<String, TagOptions>,
    /// Text before the cursor the candidates complete. When `None` the shell
    /// word ending at the cursor is used.
    pub prefix: Option<String>,
    pub usage: Option<String>,
    pub messages: Vec<String>,
}

impl Completions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Untagged candidates from plain values.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: values.into_iter().map(Candidate::new).collect(),
            ..Self::default()
        }
    }

    pub fn add(mut self, candidate: Candidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn tag_options(mut self, tag: impl Into<String>, options: TagOptions) -> Self {
        self.tags.insert(tag.into(), options);
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// External candidate source, called with the committed line and cursor.
pub trait Completer {
    fn complete(&mut self, line: &[char], cursor: usize) -> Completions;
}

impl<F> Completer for F
where
    F: FnMut(&[char], usize) -> Completions,
{
    fn complete(&mut self, line: &[char], cursor: usize) -> Completions {
        self(line, cursor)
    }
}
