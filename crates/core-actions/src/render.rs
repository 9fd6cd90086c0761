//! Render snapshot handed to the host.
//!
//! Drawing is the host's business. `RenderSnapshot` carries what a host
//! needs for one frame: the composed line (preview included) and cursor,
//! the keymaps in effect, the hint, the isearch pattern and the visible
//! slice of each completion group. `menu_lines` formats the listing as
//! plain text for simple hosts and tests.

use crate::engine::Engine;
use core_completion::{Geometry, Group, GroupLayout};
use core_keymap::{LocalKeymap, MainKeymap};
use core_state::Session;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    pub display: String,
    pub style: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub cells: Vec<CellView>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    pub tag: String,
    pub geometry: Geometry,
    /// Display width of each cell column.
    pub widths: Vec<usize>,
    /// Visible rows only.
    pub rows: Vec<RowView>,
    /// Index of the first visible row.
    pub scroll: usize,
    pub total_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSnapshot {
    pub line: String,
    pub cursor: usize,
    /// `(row, column)` of the cursor, in characters.
    pub cursor_coords: (usize, usize),
    pub main: MainKeymap,
    pub local: Option<LocalKeymap>,
    pub hint: Option<String>,
    pub isearch: Option<String>,
    pub groups: Vec<GroupView>,
}

impl Engine {
    /// Snapshot for a terminal `width` columns wide. Layout is recomputed
    /// only when the width or the line changed.
    pub fn render(&mut self, width: usize) -> RenderSnapshot {
        let session = self.session_mut();
        let revision = session.line.logical().revision();
        session.completion.layout(width, revision);
        compose(session)
    }
}

pub fn compose(session: &Session) -> RenderSnapshot {
    let logical = session.line.logical();
    let groups = session
        .completion
        .groups()
        .iter()
        .filter(|g| !g.is_empty())
        .map(group_view)
        .collect();
    RenderSnapshot {
        line: logical.to_string(),
        cursor: logical.cursor(),
        cursor_coords: logical.cursor_coords(),
        main: session.main,
        local: session.local,
        hint: session.hint().map(str::to_string),
        isearch: session.isearch.as_ref().map(|f| f.pattern()),
        groups,
    }
}

fn group_view(group: &Group) -> GroupView {
    let selected = group.selected_index();
    let candidates = group.candidates();
    let widths = match group.layout() {
        GroupLayout::Grid {
            columns, cell_width, ..
        } => vec![*cell_width; *columns],
        GroupLayout::List { widths, .. } => widths.clone(),
        GroupLayout::Map { value_width } => vec![*value_width],
    };
    let visible = group.visible_rows();
    let rows = visible
        .clone()
        .map(|r| {
            let indices = group.row(r);
            let description = match group.geometry() {
                Geometry::Grid => String::new(),
                Geometry::List | Geometry::Map => indices
                    .first()
                    .map(|&i| candidates[i].description.clone())
                    .unwrap_or_default(),
            };
            let cells = indices
                .iter()
                .map(|&i| CellView {
                    display: candidates[i].display_text().to_string(),
                    style: candidates[i].style.clone(),
                    selected: selected == Some(i),
                })
                .collect();
            RowView { cells, description }
        })
        .collect();
    GroupView {
        tag: group.tag().to_string(),
        geometry: group.geometry(),
        widths,
        rows,
        scroll: visible.start,
        total_rows: group.row_count(),
    }
}

impl RenderSnapshot {
    /// Plain-text listing: a header per tagged group, cells padded to their
    /// column width, the selected cell in brackets, descriptions after
    /// `-- `, and a `rows a-b of n` footer when a group scrolls.
    pub fn menu_lines(&self) -> Vec<String> {
        let mut out = Vec::new();
        for group in &self.groups {
            if !group.tag.is_empty() {
                out.push(format!("{}:", group.tag));
            }
            for row in &group.rows {
                let mut text = String::new();
                for (col, cell) in row.cells.iter().enumerate() {
                    let shown = if cell.selected {
                        format!("[{}]", cell.display)
                    } else {
                        cell.display.clone()
                    };
                    let width = group.widths.get(col).copied().unwrap_or(0);
                    text.push_str(&shown);
                    let pad = width.saturating_sub(shown.width()).max(1);
                    text.push_str(&" ".repeat(pad));
                }
                if !row.description.is_empty() {
                    text.push_str("-- ");
                    text.push_str(&row.description);
                }
                out.push(text.trim_end().to_string());
            }
            if group.rows.len() < group.total_rows {
                out.push(format!(
                    "rows {}-{} of {}",
                    group.scroll + 1,
                    group.scroll + group.rows.len(),
                    group.total_rows
                ));
            }
        }
        out
    }

    /// Short keymap label for a status area, e.g. `vicmd` or `emacs/menuselect`.
    pub fn mode_label(&self) -> String {
        let main = match self.main {
            MainKeymap::Emacs => "emacs",
            MainKeymap::ViInsert => "viins",
            MainKeymap::ViCommand => "vicmd",
        };
        match self.local {
            Some(LocalKeymap::MenuSelect) => format!("{main}/menuselect"),
            Some(LocalKeymap::Isearch) => format!("{main}/isearch"),
            Some(LocalKeymap::ViOpp) => format!("{main}/viopp"),
            Some(LocalKeymap::Visual) => format!("{main}/visual"),
            None => main.to_string(),
        }
    }
}
