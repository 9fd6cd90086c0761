use core_text::motion::word_before;
use core_text::{Line, LineState, VirtualInsert};
use tracing::{debug, trace};

use crate::group::{Group, Step};
use crate::suffix::PendingSuffix;
use crate::{Candidate, Completions, Geometry, TagOptions};

const NO_COMPLETIONS: &str = "no completions";
const NO_MATCHES: &str = "no matching completions";

/// Menu geometry and insertion knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOptions {
    /// Terminal width the menu is laid out for.
    pub width: usize,
    /// Blank columns after each grid cell or alias.
    pub margin: usize,
    pub max_rows: usize,
    pub map_max_rows: usize,
    /// Insert a space after a sole accepted candidate unless it ends in a
    /// no-space suffix.
    pub auto_space: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            width: 80,
            margin: 2,
            max_rows: 10,
            map_max_rows: 8,
            auto_space: false,
        }
    }
}

/// What `CompletionEngine::accept` put into the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub value: String,
    /// Text actually inserted (the value minus the typed prefix, or the
    /// whole value when it replaced the prefix).
    pub inserted: String,
    /// The candidate was the only one left and the menu was reset.
    pub finished: bool,
}

#[derive(Debug, Default)]
pub struct CompletionEngine {
    options: CompletionOptions,
    /// Groups as generated; filtering derives `groups` from these.
    generated: Vec<Group>,
    groups: Vec<Group>,
    current: Option<usize>,
    prefix: String,
    active: bool,
    hint: Option<String>,
    suffix: Option<PendingSuffix>,
    layout_key: Option<(usize, u64)>,
}

impl CompletionEngine {
    pub fn new(options: CompletionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &CompletionOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: CompletionOptions) {
        self.options = options;
        self.layout_key = None;
    }

    /// A listing is shown (possibly filtered down to nothing).
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// A candidate is selected (menu-select).
    pub fn is_selecting(&self) -> bool {
        self.current.is_some()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn current_group(&self) -> Option<usize> {
        self.current
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn set_hint(&mut self, hint: Option<String>) {
        self.hint = hint;
    }

    /// Candidates across all (filtered) groups.
    pub fn total(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    pub fn selected(&self) -> Option<&Candidate> {
        self.current
            .and_then(|g| self.groups.get(g))
            .and_then(Group::selected_candidate)
    }

    /// Replace the listing with `completions` for the line's cursor. Returns
    /// the number of candidates.
    pub fn generate(&mut self, completions: Completions, line: &mut LineState) -> usize {
        self.reset(line);
        let real = line.line();
        let before: String = real.chars()[..real.cursor()].iter().collect();
        self.prefix = match completions.prefix {
            Some(prefix) if before.ends_with(&prefix) => prefix,
            explicit => {
                if let Some(prefix) = explicit {
                    debug!(target: "completion", %prefix, "prefix_not_before_cursor");
                }
                let span = word_before(real.chars(), real.cursor());
                real.slice(span)
            }
        };

        let mut buckets: Vec<(String, Vec<Candidate>)> = Vec::new();
        for candidate in completions.candidates {
            match buckets.iter_mut().find(|(tag, _)| *tag == candidate.tag) {
                Some((_, bucket)) => bucket.push(candidate),
                None => buckets.push((candidate.tag.clone(), vec![candidate])),
            }
        }
        let fallback = TagOptions::default();
        self.generated = buckets
            .into_iter()
            .map(|(tag, candidates)| {
                let options = completions.tags.get(&tag).unwrap_or(&fallback);
                Group::new(
                    tag,
                    candidates,
                    options,
                    self.options.max_rows,
                    self.options.map_max_rows,
                )
            })
            .collect();
        self.groups = self.generated.clone();
        self.relayout(line.line().revision());

        let total = self.total();
        self.active = total > 0;
        let mut notes: Vec<String> = completions.usage.into_iter().collect();
        notes.extend(completions.messages);
        self.hint = match (total, notes.is_empty()) {
            (0, true) => Some(NO_COMPLETIONS.to_string()),
            (_, true) => None,
            (_, false) => Some(notes.join("\n")),
        };
        debug!(
            target: "completion",
            candidates = total,
            groups = self.groups.len(),
            prefix = %self.prefix,
            "generated"
        );
        total
    }

    /// Clear the listing and selection and drop any preview. A pending
    /// no-space suffix survives.
    pub fn reset(&mut self, line: &mut LineState) {
        line.drop_virtual();
        self.generated.clear();
        self.groups.clear();
        self.current = None;
        self.prefix.clear();
        self.active = false;
        self.hint = None;
        self.layout_key = None;
    }

    /// Move the selection by `dx` columns and `dy` rows, previewing the new
    /// candidate. Without a selection, enters the first (or, moving
    /// backwards, the last) candidate. Returns false when nothing is
    /// selectable.
    pub fn select(&mut self, line: &mut LineState, dx: isize, dy: isize) -> bool {
        if self.total() == 0 {
            self.hint = Some(NO_MATCHES.to_string());
            line.drop_virtual();
            return false;
        }
        let backward = dx < 0 || dy < 0;
        match self.current {
            None => self.enter(backward),
            Some(_) => {
                for _ in 0..dx.unsigned_abs() {
                    self.step(dx.signum(), 0);
                }
                for _ in 0..dy.unsigned_abs() {
                    self.step(0, dy.signum());
                }
            }
        }
        trace!(target: "completion", group = ?self.current, "select");
        self.preview(line);
        true
    }

    /// Jump to the first candidate of the next (or previous) non-empty group.
    pub fn select_tag(&mut self, line: &mut LineState, forward: bool) -> bool {
        if self.total() == 0 {
            self.hint = Some(NO_MATCHES.to_string());
            return false;
        }
        match self.current {
            None => self.enter(!forward),
            Some(from) => {
                let to = self.neighbour(from, forward);
                self.groups[from].clear_selection();
                self.groups[to].select_first();
                self.current = Some(to);
            }
        }
        self.preview(line);
        true
    }

    /// Insert the selected candidate into the line. With nothing selected,
    /// only a sole remaining candidate is accepted. Returns `None` when
    /// there is nothing to accept.
    pub fn accept(&mut self, line: &mut LineState) -> Option<Accepted> {
        if self.current.is_none() {
            if self.total() != 1 {
                return None;
            }
            self.enter(false);
        }
        let group = &self.groups[self.current?];
        let value = group.selected_candidate()?.value.clone();
        let matcher = group.no_space().clone();

        let insert = self.insertion_for(&value);
        let inserted = insert.text.clone();
        line.virtual_compose(insert);
        line.accept_virtual();

        let pos = line.line().cursor();
        self.suffix = PendingSuffix::arm(&matcher, &inserted, pos);
        let finished = self.total() == 1;
        if finished {
            if self.options.auto_space && self.suffix.is_none() {
                line.line_mut().insert_at_cursor(" ");
            }
            self.reset(line);
        } else {
            // The accepted value is now what precedes the cursor.
            self.prefix = value.clone();
            if let Some(g) = self.current.take() {
                self.groups[g].clear_selection();
            }
        }
        debug!(target: "completion", %value, finished, armed = self.suffix.is_some(), "accepted");
        Some(Accepted {
            value,
            inserted,
            finished,
        })
    }

    /// Longest common prefix of the listed values.
    pub fn common_prefix(&self) -> String {
        let mut values = self.groups.iter().flat_map(|g| g.candidates()).map(|c| &c.value);
        let Some(first) = values.next() else {
            return String::new();
        };
        let mut common: Vec<char> = first.chars().collect();
        for value in values {
            let shared = common
                .iter()
                .zip(value.chars())
                .take_while(|(a, b)| **a == *b)
                .count();
            common.truncate(shared);
        }
        common.into_iter().collect()
    }

    /// Insert the part of the common prefix not typed yet. Returns whether
    /// anything was inserted.
    pub fn insert_common_prefix(&mut self, line: &mut LineState) -> bool {
        let common = self.common_prefix();
        if common.len() <= self.prefix.len() || !common.starts_with(&self.prefix) {
            return false;
        }
        line.line_mut().insert_at_cursor(&common[self.prefix.len()..]);
        trace!(target: "completion", %common, "common_prefix_inserted");
        self.prefix = common;
        true
    }

    /// Rebuild the visible groups from the generated set, keeping the
    /// candidates `keep` accepts. Clears the selection and any preview.
    pub fn apply_filter(&mut self, line: &mut LineState, keep: impl Fn(&Candidate, Geometry) -> bool) {
        line.drop_virtual();
        self.current = None;
        self.groups = self
            .generated
            .iter()
            .map(|g| g.filtered(|c| keep(c, g.geometry())))
            .collect();
        self.relayout(line.line().revision());
        let total = self.total();
        self.hint = (total == 0).then(|| NO_MATCHES.to_string());
        debug!(target: "completion", remaining = total, "filtered");
    }

    /// Re-run layout when the width or the line changed since last time.
    /// Returns whether anything was recomputed.
    pub fn layout(&mut self, width: usize, revision: u64) -> bool {
        if self.layout_key == Some((width, revision)) {
            return false;
        }
        self.options.width = width;
        self.relayout(revision);
        true
    }

    /// Consume the pending no-space suffix against the incoming `key`.
    /// Returns whether the delimiter was removed.
    pub fn consume_suffix(&mut self, line: &mut Line, key: &str) -> bool {
        let Some(pending) = self.suffix.take() else {
            return false;
        };
        let trimmed = pending.apply(line, key);
        if trimmed {
            trace!(target: "completion", delimiter = %pending.delimiter(), "suffix_trimmed");
        }
        trimmed
    }

    pub fn pending_suffix(&self) -> Option<&PendingSuffix> {
        self.suffix.as_ref()
    }

    fn relayout(&mut self, revision: u64) {
        for group in &mut self.groups {
            group.relayout(self.options.width, self.options.margin);
        }
        self.layout_key = Some((self.options.width, revision));
    }

    fn insertion_for(&self, value: &str) -> VirtualInsert {
        match value.strip_prefix(self.prefix.as_str()) {
            Some(rest) => VirtualInsert::append(rest),
            None => VirtualInsert::new(self.prefix.chars().count(), value),
        }
    }

    fn preview(&self, line: &mut LineState) {
        match self.selected() {
            Some(candidate) => line.virtual_compose(self.insertion_for(&candidate.value)),
            None => {
                line.drop_virtual();
            }
        }
    }

    // Select the first cell of the first non-empty group, or the last cell
    // of the last one.
    fn enter(&mut self, backward: bool) {
        let found = if backward {
            self.groups.iter().rposition(|g| !g.is_empty())
        } else {
            self.groups.iter().position(|g| !g.is_empty())
        };
        if let Some(g) = found {
            if backward {
                self.groups[g].select_last();
            } else {
                self.groups[g].select_first();
            }
        }
        self.current = found;
    }

    fn step(&mut self, dx: isize, dy: isize) {
        let Some(from) = self.current else {
            return;
        };
        let forward = match self.groups[from].step(dx, dy) {
            Step::Moved => return,
            Step::PastEnd => true,
            Step::PastStart => false,
        };
        let to = self.neighbour(from, forward);
        self.groups[from].clear_selection();
        if forward {
            self.groups[to].select_first();
        } else {
            self.groups[to].select_last();
        }
        self.current = Some(to);
    }

    // Next non-empty group round-robin; `from` itself when it is the only one.
    fn neighbour(&self, from: usize, forward: bool) -> usize {
        let n = self.groups.len();
        (1..n)
            .map(|offset| {
                if forward {
                    (from + offset) % n
                } else {
                    (from + n - offset) % n
                }
            })
            .find(|&g| !self.groups[g].is_empty())
            .unwrap_or(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SuffixMatcher, TagOptions};
    use pretty_assertions::assert_eq;

    fn state(text: &str) -> LineState {
        LineState::new(Line::from(text))
    }

    fn engine() -> CompletionEngine {
        CompletionEngine::new(CompletionOptions::default())
    }

    #[test]
    fn generate_groups_by_tag_in_first_seen_order() {
        let mut e = engine();
        let mut line = state("git ");
        let c = Completions::new()
            .add(Candidate::new("commit").with_tag("commands"))
            .add(Candidate::new("origin").with_tag("remotes"))
            .add(Candidate::new("checkout").with_tag("commands"));
        assert_eq!(e.generate(c, &mut line), 3);
        let tags: Vec<&str> = e.groups().iter().map(Group::tag).collect();
        assert_eq!(tags, vec!["commands", "remotes"]);
        assert!(e.is_active());
        assert!(!e.is_selecting());
        assert_eq!(e.prefix(), "");
    }

    #[test]
    fn empty_result_sets_hint() {
        let mut e = engine();
        let mut line = state("zz");
        assert_eq!(e.generate(Completions::new(), &mut line), 0);
        assert_eq!(e.hint(), Some("no completions"));
        assert!(!e.select(&mut line, 1, 0));
    }

    #[test]
    fn select_previews_without_touching_the_line() {
        let mut e = engine();
        let mut line = state("ls ap");
        e.generate(Completions::from_values(["apple", "apply"]), &mut line);
        assert_eq!(e.prefix(), "ap");
        assert!(e.select(&mut line, 1, 0));
        assert_eq!(line.logical().to_string(), "ls apple");
        assert_eq!(line.line().to_string(), "ls ap");
        e.select(&mut line, 1, 0);
        assert_eq!(line.logical().to_string(), "ls apply");
    }

    #[test]
    fn single_group_wraps_on_exhaustion() {
        let mut e = engine();
        let mut line = state("");
        e.generate(Completions::from_values(["a", "b"]), &mut line);
        e.select(&mut line, 1, 0);
        e.select(&mut line, 1, 0);
        e.select(&mut line, 1, 0);
        assert_eq!(e.selected().map(|c| c.value.as_str()), Some("a"));
        e.select(&mut line, -1, 0);
        assert_eq!(e.selected().map(|c| c.value.as_str()), Some("b"));
    }

    #[test]
    fn exhaustion_moves_to_neighbour_group() {
        let mut e = engine();
        let mut line = state("");
        let c = Completions::new()
            .add(Candidate::new("x").with_tag("one"))
            .add(Candidate::new("y").with_tag("two"));
        e.generate(c, &mut line);
        e.select(&mut line, 1, 0);
        assert_eq!(e.current_group(), Some(0));
        e.select(&mut line, 1, 0);
        assert_eq!(e.current_group(), Some(1));
        e.select(&mut line, 1, 0);
        assert_eq!(e.current_group(), Some(0));
        e.select_tag(&mut line, false);
        assert_eq!(e.selected().map(|c| c.value.as_str()), Some("y"));
    }

    #[test]
    fn accept_inserts_remainder_and_resets_when_sole() {
        let mut e = engine();
        let mut line = state("ls ap");
        e.generate(Completions::from_values(["apple"]), &mut line);
        let accepted = e.accept(&mut line).unwrap();
        assert_eq!(accepted.inserted, "ple");
        assert!(accepted.finished);
        assert_eq!(line.line().to_string(), "ls apple");
        assert!(!e.is_active());
        assert!(!line.is_previewing());
    }

    #[test]
    fn accept_replaces_prefix_that_value_does_not_extend() {
        let mut e = engine();
        let mut line = state("cd ~/do");
        let c = Completions::from_values(["/home/u/docs/"]).with_prefix("~/do");
        e.generate(c, &mut line);
        let accepted = e.accept(&mut line).unwrap();
        assert_eq!(accepted.inserted, "/home/u/docs/");
        assert_eq!(line.line().to_string(), "cd /home/u/docs/");
    }

    #[test]
    fn accept_without_selection_among_many_is_refused() {
        let mut e = engine();
        let mut line = state("a");
        e.generate(Completions::from_values(["ab", "ac"]), &mut line);
        assert_eq!(e.accept(&mut line), None);
        assert_eq!(line.line().to_string(), "a");
    }

    #[test]
    fn accept_among_many_keeps_listing() {
        let mut e = engine();
        let mut line = state("a");
        e.generate(Completions::from_values(["ab", "ac"]), &mut line);
        e.select(&mut line, 1, 0);
        let accepted = e.accept(&mut line).unwrap();
        assert!(!accepted.finished);
        assert_eq!(line.line().to_string(), "ab");
        assert!(e.is_active());
        assert!(!e.is_selecting());
        // The next selection replaces the accepted value.
        e.select(&mut line, 1, 0);
        e.select(&mut line, 1, 0);
        assert_eq!(line.logical().to_string(), "ac");
    }

    #[test]
    fn accept_arms_no_space_suffix() {
        let mut e = engine();
        let mut line = state("cd sr");
        let c = Completions::new()
            .add(Candidate::new("src/").with_tag("dirs"))
            .tag_options(
                "dirs",
                TagOptions {
                    no_space: SuffixMatcher::new("/"),
                    ..TagOptions::default()
                },
            );
        e.generate(c, &mut line);
        e.accept(&mut line).unwrap();
        assert_eq!(line.line().to_string(), "cd src/");
        assert_eq!(e.pending_suffix().map(|s| s.position()), Some(7));

        let mut real = line.line().clone();
        assert!(e.consume_suffix(&mut real, "/"));
        assert_eq!(real.to_string(), "cd src");
        assert!(e.pending_suffix().is_none());
    }

    #[test]
    fn auto_space_follows_sole_accept() {
        let mut e = CompletionEngine::new(CompletionOptions {
            auto_space: true,
            ..CompletionOptions::default()
        });
        let mut line = state("gi");
        e.generate(Completions::from_values(["git"]), &mut line);
        e.accept(&mut line);
        assert_eq!(line.line().to_string(), "git ");
    }

    #[test]
    fn common_prefix_is_inserted_once() {
        let mut e = engine();
        let mut line = state("a");
        e.generate(Completions::from_values(["apple", "apply"]), &mut line);
        assert_eq!(e.common_prefix(), "appl");
        assert!(e.insert_common_prefix(&mut line));
        assert_eq!(line.line().to_string(), "appl");
        assert!(!e.insert_common_prefix(&mut line));
    }

    #[test]
    fn filter_to_nothing_keeps_listing_with_hint() {
        let mut e = engine();
        let mut line = state("");
        e.generate(Completions::from_values(["a", "b"]), &mut line);
        e.select(&mut line, 1, 0);
        e.apply_filter(&mut line, |_, _| false);
        assert!(e.is_active());
        assert_eq!(e.total(), 0);
        assert_eq!(e.hint(), Some("no matching completions"));
        assert!(!line.is_previewing());
        e.apply_filter(&mut line, |_, _| true);
        assert_eq!(e.total(), 2);
        assert_eq!(e.hint(), None);
    }

    #[test]
    fn layout_is_cached_per_width_and_revision() {
        let mut e = engine();
        let mut line = state("");
        e.generate(Completions::from_values(["a"]), &mut line);
        let rev = line.line().revision();
        assert!(!e.layout(80, rev));
        assert!(e.layout(40, rev));
        assert!(e.layout(40, rev + 1));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        fn selected_value(e: &CompletionEngine) -> String {
            e.selected().map(|c| c.value.clone()).unwrap_or_default()
        }

        proptest! {
            #[test]
            fn grid_steps_visit_every_candidate_once(
                values in prop::collection::btree_set("[a-z]{1,8}", 1..30),
                width in 1usize..60,
                vertical in any::<bool>(),
            ) {
                let mut e = CompletionEngine::new(CompletionOptions {
                    width,
                    max_rows: 3,
                    ..CompletionOptions::default()
                });
                let mut line = state("");
                let n = e.generate(Completions::from_values(values.clone()), &mut line);
                prop_assert_eq!(n, values.len());

                let (dx, dy) = if vertical { (0, 1) } else { (1, 0) };
                e.select(&mut line, 1, 0);
                let first = selected_value(&e);
                let mut seen = BTreeSet::new();
                for _ in 0..n {
                    prop_assert!(seen.insert(selected_value(&e)));
                    let group = &e.groups()[0];
                    let (row, _) = group.selected_cell().unwrap_or((usize::MAX, 0));
                    prop_assert!(group.visible_rows().contains(&row));
                    e.select(&mut line, dx, dy);
                }
                prop_assert_eq!(&seen, &values);
                prop_assert_eq!(selected_value(&e), first);
            }
        }
    }
}
