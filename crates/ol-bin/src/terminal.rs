//! Inline prompt drawing on a raw-mode terminal.

use std::io::{Stdout, Write, stdout};

use anyhow::Result;
use core_actions::RenderSnapshot;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode, size};
use crossterm::queue;
use unicode_width::UnicodeWidthStr;

/// Raw mode for the lifetime of the value; restored on drop, including
/// during unwinding.
pub struct Terminal {
    out: Stdout,
    active: bool,
}

impl Terminal {
    pub fn enter() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self {
            out: stdout(),
            active: true,
        })
    }

    pub fn width(&self) -> usize {
        size().map(|(w, _)| w as usize).unwrap_or(80)
    }

    /// Redraw the prompt row and everything below it: search pattern,
    /// menu rows, then the hint. Leaves the terminal cursor on the line.
    pub fn draw(&mut self, prompt: &str, snapshot: &RenderSnapshot) -> Result<()> {
        let line = flatten(&snapshot.line);
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::FromCursorDown),
            Print(prompt),
            Print(&line)
        )?;

        let below = status_lines(snapshot);
        for text in &below {
            queue!(self.out, Print("\r\n"), Print(text))?;
        }
        if !below.is_empty() {
            queue!(self.out, MoveUp(below.len() as u16))?;
        }

        let before: String = line.chars().take(snapshot.cursor).collect();
        let column = prompt.width() + before.width();
        queue!(self.out, MoveToColumn(column as u16))?;
        self.out.flush()?;
        Ok(())
    }

    /// Final rendering of a finished line; the menu is erased and the cursor
    /// moves to a fresh row.
    pub fn finish(&mut self, prompt: &str, snapshot: &RenderSnapshot) -> Result<()> {
        queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::FromCursorDown),
            Print(prompt),
            Print(flatten(&snapshot.line)),
            Print("\r\n")
        )?;
        self.out.flush()?;
        Ok(())
    }

    pub fn print_line(&mut self, text: &str) -> Result<()> {
        queue!(self.out, MoveToColumn(0), Print(text), Print("\r\n"))?;
        self.out.flush()?;
        Ok(())
    }

    pub fn leave(&mut self) -> Result<()> {
        if self.active {
            disable_raw_mode()?;
            self.active = false;
        }
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

// Multi-row lines are drawn on one terminal row.
fn flatten(line: &str) -> String {
    line.replace('\n', " ")
}

pub fn status_lines(snapshot: &RenderSnapshot) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(pattern) = &snapshot.isearch {
        out.push(format!("isearch: {pattern}"));
    }
    out.extend(snapshot.menu_lines());
    if let Some(hint) = &snapshot.hint {
        out.push(hint.clone());
    }
    out
}
