//! Completion menu commands.
//!
//! Each command works on the engine and the line state it previews into and
//! reports how the local keymap should change; the dispatcher applies that.

use core_completion::{Completer, CompletionEngine};
use core_keymap::LocalKeymap;
use core_text::LineState;
use tracing::debug;

/// Local keymap change requested by a completion command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Enter(LocalKeymap),
    /// Leave menu-select or isearch.
    Exit,
}

fn generate(engine: &mut CompletionEngine, line: &mut LineState, completer: &mut dyn Completer) -> usize {
    let real = line.line();
    let completions = completer.complete(real.chars(), real.cursor());
    engine.generate(completions, line)
}

/// Generate and act on the count: a sole candidate is accepted, a longer
/// common prefix is inserted and listed, anything else enters menu-select.
/// With a listing already shown, behaves like `menu_select`.
pub fn complete(
    engine: &mut CompletionEngine,
    line: &mut LineState,
    completer: &mut dyn Completer,
) -> Transition {
    if engine.is_active() && !engine.is_selecting() {
        return menu_select(engine, line, completer, 1, 0);
    }
    match generate(engine, line, completer) {
        0 => Transition::Stay,
        1 => {
            engine.accept(line);
            Transition::Stay
        }
        _ if engine.insert_common_prefix(line) => {
            debug!(target: "completion", "listed_after_common_prefix");
            Transition::Stay
        }
        _ => select_or_stay(engine, line, 1, 0),
    }
}

/// Move the selection, generating first when no listing is shown.
pub fn menu_select(
    engine: &mut CompletionEngine,
    line: &mut LineState,
    completer: &mut dyn Completer,
    dx: isize,
    dy: isize,
) -> Transition {
    if !engine.is_active() {
        match generate(engine, line, completer) {
            0 => return Transition::Stay,
            1 => {
                engine.accept(line);
                return Transition::Stay;
            }
            _ => {}
        }
    }
    select_or_stay(engine, line, dx, dy)
}

fn select_or_stay(engine: &mut CompletionEngine, line: &mut LineState, dx: isize, dy: isize) -> Transition {
    if engine.select(line, dx, dy) {
        Transition::Enter(LocalKeymap::MenuSelect)
    } else {
        Transition::Stay
    }
}

pub fn menu_tag(engine: &mut CompletionEngine, line: &mut LineState, forward: bool) -> Transition {
    if engine.select_tag(line, forward) {
        Transition::Enter(LocalKeymap::MenuSelect)
    } else {
        Transition::Stay
    }
}

/// Accept the selection (or the sole remaining candidate) and close the
/// menu. Nothing to accept keeps the menu open.
pub fn menu_accept(engine: &mut CompletionEngine, line: &mut LineState) -> Transition {
    match engine.accept(line) {
        Some(_) => {
            engine.reset(line);
            Transition::Exit
        }
        None => Transition::Stay,
    }
}

/// Close the menu and restore the pre-menu line.
pub fn menu_cancel(engine: &mut CompletionEngine, line: &mut LineState) -> Transition {
    engine.reset(line);
    Transition::Exit
}

/// Enter incremental search over the listing, generating one if needed.
pub fn start_isearch(
    engine: &mut CompletionEngine,
    line: &mut LineState,
    completer: &mut dyn Completer,
) -> Transition {
    if !engine.is_active() && generate(engine, line, completer) == 0 {
        return Transition::Stay;
    }
    Transition::Enter(LocalKeymap::Isearch)
}
