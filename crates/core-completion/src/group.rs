//! Tagged candidate group: geometry, layout metrics, and cell navigation.
//!
//! Selection is a `(row, column)` cell. How a cell maps to a candidate
//! depends on the geometry:
//!
//! * Grid: row-major, `index = row * columns + column`. Horizontal moves walk
//!   the flat order; vertical moves fall through to the top of the next
//!   column (or the bottom of the previous one).
//! * List: one row per distinct non-empty description, candidates sharing it
//!   sit in alias columns. Rows may be ragged; vertical moves skip rows that
//!   lack the current column and then fall through to the next column.
//! * Map: one candidate per row; both axes move vertically.
//!
//! Leaving the first or last cell reports exhaustion so the engine can move
//! to another group.

use std::ops::Range;

use crate::{Candidate, Geometry, SuffixMatcher, TagOptions};
use unicode_width::UnicodeWidthStr;

/// Result of one unit step inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Moved,
    /// Stepped past the last cell.
    PastEnd,
    /// Stepped before the first cell.
    PastStart,
}

/// Layout metrics for a group at a given terminal width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupLayout {
    Grid {
        columns: usize,
        rows: usize,
        cell_width: usize,
    },
    List {
        /// Candidate indices per row, aliases in column order.
        rows: Vec<Vec<usize>>,
        /// Display width of each alias column.
        widths: Vec<usize>,
        description_width: usize,
    },
    Map {
        value_width: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Group {
    tag: String,
    geometry: Geometry,
    candidates: Vec<Candidate>,
    no_space: SuffixMatcher,
    max_rows: usize,
    layout: GroupLayout,
    selected: Option<(usize, usize)>,
    scroll: usize,
}

impl Group {
    pub(crate) fn new(
        tag: String,
        candidates: Vec<Candidate>,
        options: &TagOptions,
        max_rows: usize,
        map_max_rows: usize,
    ) -> Self {
        let geometry = options.geometry.unwrap_or_else(|| {
            if candidates.iter().any(|c| !c.description.is_empty()) {
                Geometry::List
            } else {
                Geometry::Grid
            }
        });
        let default_rows = match geometry {
            Geometry::Map => map_max_rows,
            _ => max_rows,
        };
        Self {
            tag,
            geometry,
            candidates,
            no_space: options.no_space.clone(),
            max_rows: options.max_rows.unwrap_or(default_rows).max(1),
            layout: GroupLayout::Map { value_width: 0 },
            selected: None,
            scroll: 0,
        }
    }

    /// Same tag and options over the candidates `keep` accepts.
    pub(crate) fn filtered(&self, keep: impl Fn(&Candidate) -> bool) -> Self {
        Self {
            tag: self.tag.clone(),
            geometry: self.geometry,
            candidates: self.candidates.iter().filter(|c| keep(c)).cloned().collect(),
            no_space: self.no_space.clone(),
            max_rows: self.max_rows,
            layout: GroupLayout::Map { value_width: 0 },
            selected: None,
            scroll: 0,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn no_space(&self) -> &SuffixMatcher {
        &self.no_space
    }

    pub fn layout(&self) -> &GroupLayout {
        &self.layout
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn selected_cell(&self) -> Option<(usize, usize)> {
        self.selected
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected.and_then(|cell| self.index_of(cell))
    }

    pub fn selected_candidate(&self) -> Option<&Candidate> {
        self.selected_index().map(|i| &self.candidates[i])
    }

    pub fn row_count(&self) -> usize {
        match &self.layout {
            GroupLayout::Grid { rows, .. } => *rows,
            GroupLayout::List { rows, .. } => rows.len(),
            GroupLayout::Map { .. } => self.candidates.len(),
        }
    }

    /// Candidate indices shown in row `row`, left to right.
    pub fn row(&self, row: usize) -> Vec<usize> {
        match &self.layout {
            GroupLayout::Grid { columns, .. } => {
                let start = row * columns;
                (start..(start + columns).min(self.candidates.len())).collect()
            }
            GroupLayout::List { rows, .. } => rows.get(row).cloned().unwrap_or_default(),
            GroupLayout::Map { .. } if row < self.candidates.len() => vec![row],
            GroupLayout::Map { .. } => Vec::new(),
        }
    }

    /// Rows inside the scroll window.
    pub fn visible_rows(&self) -> Range<usize> {
        let total = self.row_count();
        let start = self.scroll.min(total);
        start..(start + self.max_rows).min(total)
    }

    /// Recompute metrics for `width` columns. The selected candidate, if any,
    /// stays selected.
    pub(crate) fn relayout(&mut self, width: usize, margin: usize) {
        let selected = self.selected_index();
        self.layout = match self.geometry {
            Geometry::Grid => {
                let widest = self
                    .candidates
                    .iter()
                    .map(|c| c.display_text().width())
                    .max()
                    .unwrap_or(0);
                let cell_width = (widest + margin).max(1);
                let columns = (width / cell_width)
                    .clamp(1, self.candidates.len().max(1));
                let rows = self.candidates.len().div_ceil(columns);
                GroupLayout::Grid {
                    columns,
                    rows,
                    cell_width,
                }
            }
            Geometry::List => {
                let mut rows: Vec<Vec<usize>> = Vec::new();
                let mut keys: Vec<&str> = Vec::new();
                for (i, c) in self.candidates.iter().enumerate() {
                    let found = if c.description.is_empty() {
                        None
                    } else {
                        keys.iter().position(|k| *k == c.description)
                    };
                    match found {
                        Some(r) => rows[r].push(i),
                        None => {
                            rows.push(vec![i]);
                            keys.push(&c.description);
                        }
                    }
                }
                let mut widths: Vec<usize> = Vec::new();
                for row in &rows {
                    for (slot, &i) in row.iter().enumerate() {
                        let w = self.candidates[i].display_text().width() + margin;
                        match widths.get_mut(slot) {
                            Some(cur) => *cur = (*cur).max(w),
                            None => widths.push(w),
                        }
                    }
                }
                let description_width = self
                    .candidates
                    .iter()
                    .map(|c| c.description.width())
                    .max()
                    .unwrap_or(0);
                GroupLayout::List {
                    rows,
                    widths,
                    description_width,
                }
            }
            Geometry::Map => GroupLayout::Map {
                value_width: self
                    .candidates
                    .iter()
                    .map(|c| c.display_text().width() + margin)
                    .max()
                    .unwrap_or(0),
            },
        };
        self.selected = selected.map(|i| self.cell_of(i));
        self.follow();
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selected = None;
        self.scroll = 0;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = (!self.is_empty()).then_some((0, 0));
        self.follow();
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.candidates.len().checked_sub(1).map(|i| self.cell_of(i));
        self.follow();
    }

    /// One unit step. `dx`/`dy` are -1, 0 or 1; horizontal wins when both
    /// are set.
    pub(crate) fn step(&mut self, dx: isize, dy: isize) -> Step {
        let Some(cell) = self.selected else {
            return Step::PastEnd;
        };
        let next = match (&self.layout, dx, dy) {
            (GroupLayout::Map { .. }, 0, 0) => return Step::Moved,
            (GroupLayout::Map { .. }, dx, dy) => self.step_linear(cell, if dx != 0 { dx } else { dy }),
            (_, 0, 0) => return Step::Moved,
            (_, dx, _) if dx != 0 => self.step_linear(cell, dx),
            (GroupLayout::Grid { columns, .. }, _, dy) => self.step_grid_vertical(cell, *columns, dy),
            (GroupLayout::List { rows, .. }, _, dy) => Self::step_list_vertical(rows, cell, dy),
        };
        match next {
            Ok(cell) => {
                self.selected = Some(cell);
                self.follow();
                Step::Moved
            }
            Err(step) => step,
        }
    }

    // Moves along the flat reading order (row by row, left to right).
    fn step_linear(&self, cell: (usize, usize), delta: isize) -> Result<(usize, usize), Step> {
        if let GroupLayout::List { rows, .. } = &self.layout {
            let (r, c) = cell;
            return if delta > 0 {
                if c + 1 < rows[r].len() {
                    Ok((r, c + 1))
                } else if r + 1 < rows.len() {
                    Ok((r + 1, 0))
                } else {
                    Err(Step::PastEnd)
                }
            } else if c > 0 {
                Ok((r, c - 1))
            } else if r > 0 {
                Ok((r - 1, rows[r - 1].len() - 1))
            } else {
                Err(Step::PastStart)
            };
        }
        let index = self.index_of(cell).unwrap_or(0);
        if delta > 0 {
            if index + 1 < self.candidates.len() {
                Ok(self.cell_of(index + 1))
            } else {
                Err(Step::PastEnd)
            }
        } else if index > 0 {
            Ok(self.cell_of(index - 1))
        } else {
            Err(Step::PastStart)
        }
    }

    fn step_grid_vertical(
        &self,
        (r, c): (usize, usize),
        columns: usize,
        dy: isize,
    ) -> Result<(usize, usize), Step> {
        let n = self.candidates.len();
        if dy > 0 {
            if (r + 1) * columns + c < n {
                Ok((r + 1, c))
            } else if c + 1 < columns && c + 1 < n {
                Ok((0, c + 1))
            } else {
                Err(Step::PastEnd)
            }
        } else if r > 0 {
            Ok((r - 1, c))
        } else if c > 0 {
            // Bottom of the previous column.
            Ok(((n - c) / columns, c - 1))
        } else {
            Err(Step::PastStart)
        }
    }

    fn step_list_vertical(
        rows: &[Vec<usize>],
        (r, c): (usize, usize),
        dy: isize,
    ) -> Result<(usize, usize), Step> {
        if dy > 0 {
            if let Some(next) = (r + 1..rows.len()).find(|&i| rows[i].len() > c) {
                return Ok((next, c));
            }
            let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
            for col in c + 1..columns {
                if let Some(top) = (0..rows.len()).find(|&i| rows[i].len() > col) {
                    return Ok((top, col));
                }
            }
            Err(Step::PastEnd)
        } else {
            if let Some(prev) = (0..r).rev().find(|&i| rows[i].len() > c) {
                return Ok((prev, c));
            }
            for col in (0..c).rev() {
                if let Some(bottom) = (0..rows.len()).rev().find(|&i| rows[i].len() > col) {
                    return Ok((bottom, col));
                }
            }
            Err(Step::PastStart)
        }
    }

    fn index_of(&self, (row, col): (usize, usize)) -> Option<usize> {
        let index = match &self.layout {
            GroupLayout::Grid { columns, .. } => row * columns + col,
            GroupLayout::List { rows, .. } => *rows.get(row)?.get(col)?,
            GroupLayout::Map { .. } => row,
        };
        (index < self.candidates.len()).then_some(index)
    }

    fn cell_of(&self, index: usize) -> (usize, usize) {
        match &self.layout {
            GroupLayout::Grid { columns, .. } => (index / columns, index % columns),
            GroupLayout::List { rows, .. } => rows
                .iter()
                .enumerate()
                .find_map(|(r, row)| row.iter().position(|&i| i == index).map(|c| (r, c)))
                .unwrap_or((0, 0)),
            GroupLayout::Map { .. } => (index, 0),
        }
    }

    // Keeps the selected row inside the scroll window.
    fn follow(&mut self) {
        let Some((row, _)) = self.selected else {
            return;
        };
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + self.max_rows {
            self.scroll = row + 1 - self.max_rows;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grid(values: &[&str], width: usize) -> Group {
        let candidates = values.iter().map(|v| Candidate::new(*v)).collect();
        let mut g = Group::new(String::new(), candidates, &TagOptions::default(), 10, 8);
        g.relayout(width, 2);
        g
    }

    fn value(g: &Group) -> &str {
        &g.selected_candidate().unwrap().value
    }

    #[test]
    fn grid_columns_fit_width() {
        // widest 3 + margin 2 = 5; 12 / 5 = 2 columns
        let g = grid(&["aaa", "bb", "c", "dd", "e"], 12);
        assert_eq!(
            g.layout(),
            &GroupLayout::Grid {
                columns: 2,
                rows: 3,
                cell_width: 5
            }
        );
        assert_eq!(g.row(2), vec![4]);
    }

    #[test]
    fn grid_right_walks_rows_left_to_right() {
        // a b c
        // d e f
        // g
        let mut g = grid(&["a", "b", "c", "d", "e", "f", "g"], 9);
        g.select_first();
        for _ in 0..3 {
            assert_eq!(g.step(1, 0), Step::Moved);
        }
        assert_eq!(g.selected_cell(), Some((1, 0)));
        assert_eq!(value(&g), "d");
        assert_eq!(g.step(1, 0), Step::Moved);
        assert_eq!(g.selected_cell(), Some((1, 1)));
        assert_eq!(value(&g), "e");
        g.step(1, 0);
        g.step(1, 0);
        assert_eq!(value(&g), "g");
        assert_eq!(g.step(1, 0), Step::PastEnd);
        assert_eq!(value(&g), "g");
    }

    #[test]
    fn grid_down_falls_through_to_next_column() {
        let mut g = grid(&["a", "b", "c", "d", "e", "f", "g"], 9);
        g.select_first();
        let mut seen = vec![value(&g).to_string()];
        while g.step(0, 1) == Step::Moved {
            seen.push(value(&g).to_string());
        }
        assert_eq!(seen, vec!["a", "d", "g", "b", "e", "c", "f"]);
    }

    #[test]
    fn grid_up_falls_back_to_previous_column_bottom() {
        let mut g = grid(&["a", "b", "c", "d", "e", "f", "g"], 9);
        g.select_last();
        let mut seen = vec![value(&g).to_string()];
        while g.step(0, -1) == Step::Moved {
            seen.push(value(&g).to_string());
        }
        assert_eq!(seen, vec!["g", "d", "a"]);
        assert_eq!(g.step(0, -1), Step::PastStart);

        g.selected = Some((0, 2));
        g.step(0, -1);
        assert_eq!(value(&g), "e");
    }

    fn aliases() -> Group {
        let candidates = vec![
            Candidate::new("-h").with_description("show help"),
            Candidate::new("--help").with_description("show help"),
            Candidate::new("-v").with_description("verbose"),
            Candidate::new("-q").with_description("quiet"),
            Candidate::new("--quiet").with_description("quiet"),
        ];
        let mut g = Group::new("flags".into(), candidates, &TagOptions::default(), 10, 8);
        g.relayout(80, 2);
        g
    }

    #[test]
    fn dropping_an_alias_leaves_one_column_in_its_row() {
        let mut g = aliases().filtered(|c| c.value != "--help");
        g.relayout(80, 2);
        assert_eq!(g.row(0), vec![0]);
        assert_eq!(g.candidates()[0].value, "-h");
        assert_eq!(g.row(2), vec![2, 3]);

        let mut g = aliases().filtered(|c| c.description == "show help" && c.value != "--help");
        g.relayout(80, 2);
        assert_eq!(
            g.layout(),
            &GroupLayout::List {
                rows: vec![vec![0]],
                widths: vec![4],
                description_width: 9,
            }
        );
    }

    #[test]
    fn list_groups_aliases_by_description() {
        let g = aliases();
        assert_eq!(g.geometry(), Geometry::List);
        assert_eq!(
            g.layout(),
            &GroupLayout::List {
                rows: vec![vec![0, 1], vec![2], vec![3, 4]],
                widths: vec![4, 9],
                description_width: 9,
            }
        );
    }

    #[test]
    fn list_down_skips_rows_without_the_column() {
        let mut g = aliases();
        g.selected = Some((0, 1));
        assert_eq!(g.step(0, 1), Step::Moved);
        assert_eq!(value(&g), "--quiet");
        assert_eq!(g.step(0, 1), Step::PastEnd);

        g.selected = Some((2, 0));
        g.step(0, 1);
        assert_eq!(value(&g), "--help");
    }

    #[test]
    fn list_up_falls_back_to_previous_column() {
        let mut g = aliases();
        g.selected = Some((0, 1));
        g.step(0, -1);
        assert_eq!(value(&g), "-q");
        assert_eq!(g.selected_cell(), Some((2, 0)));
    }

    #[test]
    fn list_right_wraps_into_next_row() {
        let mut g = aliases();
        g.selected = Some((0, 1));
        g.step(1, 0);
        assert_eq!(value(&g), "-v");
        g.step(-1, 0);
        assert_eq!(value(&g), "--help");
    }

    #[test]
    fn map_moves_vertically_on_both_axes() {
        let candidates = vec![Candidate::new("a"), Candidate::new("b")];
        let options = TagOptions {
            geometry: Some(Geometry::Map),
            ..TagOptions::default()
        };
        let mut g = Group::new(String::new(), candidates, &options, 10, 8);
        g.relayout(80, 2);
        assert_eq!(g.max_rows(), 8);
        g.select_first();
        g.step(1, 0);
        assert_eq!(value(&g), "b");
        assert_eq!(g.step(0, 1), Step::PastEnd);
        g.step(0, -1);
        assert_eq!(value(&g), "a");
    }

    #[test]
    fn scroll_window_follows_selection() {
        let candidates = (0..20).map(|i| Candidate::new(format!("{i:02}"))).collect();
        let options = TagOptions {
            geometry: Some(Geometry::Map),
            max_rows: Some(5),
            ..TagOptions::default()
        };
        let mut g = Group::new(String::new(), candidates, &options, 10, 8);
        g.relayout(80, 2);
        g.select_first();
        assert_eq!(g.visible_rows(), 0..5);
        for _ in 0..7 {
            g.step(0, 1);
        }
        assert_eq!(g.visible_rows(), 3..8);
        g.select_last();
        assert_eq!(g.visible_rows(), 15..20);
    }

    #[test]
    fn relayout_keeps_selected_candidate() {
        let mut g = grid(&["a", "b", "c", "d", "e", "f", "g"], 9);
        g.select_first();
        for _ in 0..4 {
            g.step(1, 0);
        }
        g.relayout(6, 2);
        assert_eq!(value(&g), "e");
        assert_eq!(g.selected_cell(), Some((2, 0)));
    }
}
