//! Crossterm key events to the decoded sequences keymaps are written in.

use core_keymap::notation::{
    BACKSPACE, BACKTAB, DELETE, DOWN, END, ENTER, ESC, HOME, LEFT, PAGE_DOWN, PAGE_UP, RIGHT, TAB,
    UP, ctrl, meta,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// The sequence a terminal would send for `event`. Alt prefixes escape,
/// Control folds letters to C0 codes. `None` for releases and keys no
/// keymap can name (function keys, media keys).
pub fn key_sequence(event: &KeyEvent) -> Option<String> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    let base = match event.code {
        KeyCode::Char(c) if event.modifiers.contains(KeyModifiers::CONTROL) => ctrl(c)?.to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => ENTER.to_string(),
        KeyCode::Esc => ESC.to_string(),
        KeyCode::Backspace => BACKSPACE.to_string(),
        KeyCode::Tab => TAB.to_string(),
        KeyCode::BackTab => BACKTAB.to_string(),
        KeyCode::Up => UP.to_string(),
        KeyCode::Down => DOWN.to_string(),
        KeyCode::Left => LEFT.to_string(),
        KeyCode::Right => RIGHT.to_string(),
        KeyCode::Home => HOME.to_string(),
        KeyCode::End => END.to_string(),
        KeyCode::PageUp => PAGE_UP.to_string(),
        KeyCode::PageDown => PAGE_DOWN.to_string(),
        KeyCode::Delete => DELETE.to_string(),
        _ => return None,
    };
    if event.modifiers.contains(KeyModifiers::ALT) {
        Some(meta(&base))
    } else {
        Some(base)
    }
}
