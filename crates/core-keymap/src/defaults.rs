//! Builtin keymap tables.
//!
//! Sequences are already decoded (what a terminal sends after key decoding).
//! Printable characters are deliberately unbound in insertion keymaps: they
//! fall through to self-insert.

use crate::notation::{
    BACKSPACE, BACKTAB, DELETE, DOWN, END, ENTER, ESC, HOME, LEFT, NEWLINE, PAGE_DOWN, PAGE_UP,
    RIGHT, TAB, UP, meta,
};
use crate::{BindingSpec, KeymapKind, KeymapTable};

fn table_from(pairs: &[(&str, &str)]) -> KeymapTable {
    let mut table = KeymapTable::new();
    for (seq, cmd) in pairs {
        table.bind_command(*seq, cmd);
    }
    table
}

pub(crate) fn table(kind: KeymapKind) -> KeymapTable {
    match kind {
        KeymapKind::Emacs => emacs(),
        KeymapKind::ViInsert => vi_insert(),
        KeymapKind::ViCommand => vi_command(),
        KeymapKind::MenuSelect => menu_select(),
        KeymapKind::Isearch => isearch(),
        KeymapKind::ViOpp => KeymapTable::new(),
        KeymapKind::Visual => visual(),
    }
}

// Bindings shared by both insertion keymaps.
fn insertion_common(table: &mut KeymapTable) {
    for (seq, cmd) in [
        (BACKSPACE, "backward-delete-char"),
        ("\x08", "backward-delete-char"),
        ("\x17", "unix-word-rubout"),
        ("\x15", "backward-kill-line"),
        (TAB, "complete"),
        (BACKTAB, "menu-complete-backward"),
        (ENTER, "accept-line"),
        (NEWLINE, "accept-line"),
        ("\x12", "menu-incremental-search"),
        (LEFT, "backward-char"),
        (RIGHT, "forward-char"),
        (HOME, "beginning-of-line"),
        (END, "end-of-line"),
        (DELETE, "delete-char"),
    ] {
        table.bind_command(seq, cmd);
    }
}

fn emacs() -> KeymapTable {
    let mut table = table_from(&[
        ("\x01", "beginning-of-line"),
        ("\x05", "end-of-line"),
        ("\x06", "forward-char"),
        ("\x02", "backward-char"),
        ("\x04", "delete-char"),
        ("\x0b", "kill-line"),
        ("\x19", "yank"),
        ("\x14", "transpose-chars"),
        ("\x1f", "undo"),
        ("\x18\x15", "undo"),
        ("\x18\x16", "vi-editing-mode"),
        ("\x07", "abort"),
    ]);
    insertion_common(&mut table);
    table.bind_command(meta("f"), "emacs-forward-word");
    table.bind_command(meta("b"), "backward-word");
    table.bind_command(meta("d"), "kill-word");
    table.bind_command(meta(BACKSPACE), "backward-kill-word");
    table.bind_command(meta("F"), "forward-shell-word");
    table.bind_command(meta("B"), "backward-shell-word");
    table.bind_command(meta("/"), "redo");
    for d in '0'..='9' {
        table.bind_command(meta(&d.to_string()), "digit-argument");
    }
    table
}

fn vi_insert() -> KeymapTable {
    let mut table = table_from(&[(ESC, "vi-command-mode")]);
    insertion_common(&mut table);
    table
}

fn vi_command() -> KeymapTable {
    let mut table = table_from(&[
        ("h", "backward-char"),
        ("l", "forward-char"),
        (" ", "forward-char"),
        ("w", "forward-word"),
        ("b", "backward-word"),
        ("e", "forward-word-end"),
        ("W", "forward-blank-word"),
        ("B", "backward-blank-word"),
        ("0", "vi-digit-or-beginning-of-line"),
        ("^", "beginning-of-line"),
        ("$", "end-of-line"),
        ("x", "vi-delete-char"),
        ("d", "delete-motion"),
        ("c", "change-motion"),
        ("y", "yank-motion"),
        ("p", "vi-put-after"),
        ("P", "vi-put-before"),
        ("u", "undo"),
        ("\x12", "redo"),
        ("i", "vi-insert-mode"),
        ("a", "vi-append-mode"),
        ("A", "vi-append-eol"),
        ("I", "vi-insert-bol"),
        ("v", "vi-visual-mode"),
        ("/", "menu-incremental-search"),
        ("\x05", "emacs-editing-mode"),
        (ESC, "abort"),
        (ENTER, "accept-line"),
        (NEWLINE, "accept-line"),
        (TAB, "complete"),
        (LEFT, "backward-char"),
        (RIGHT, "forward-char"),
        (HOME, "beginning-of-line"),
        (END, "end-of-line"),
        (DELETE, "vi-delete-char"),
        (BACKSPACE, "backward-char"),
    ]);
    for d in '1'..='9' {
        table.bind_command(d.to_string(), "digit-argument");
    }
    table.bind("D", BindingSpec::Macro("d$".into()));
    table.bind("C", BindingSpec::Macro("c$".into()));
    table
}

fn menu_select() -> KeymapTable {
    table_from(&[
        (TAB, "menu-complete"),
        (BACKTAB, "menu-complete-backward"),
        (UP, "menu-select-up"),
        (DOWN, "menu-select-down"),
        (RIGHT, "menu-select-right"),
        (LEFT, "menu-select-left"),
        ("\x0e", "menu-select-down"),
        ("\x10", "menu-select-up"),
        (PAGE_DOWN, "menu-next-tag"),
        (PAGE_UP, "menu-prev-tag"),
        (ENTER, "menu-accept"),
        (NEWLINE, "menu-accept"),
        ("\x07", "menu-cancel"),
        (ESC, "menu-cancel"),
        ("\x12", "menu-incremental-search"),
    ])
}

fn isearch() -> KeymapTable {
    table_from(&[
        (TAB, "menu-complete"),
        (BACKTAB, "menu-complete-backward"),
        ("\x12", "menu-complete"),
        (UP, "menu-select-up"),
        (DOWN, "menu-select-down"),
        (RIGHT, "menu-select-right"),
        (LEFT, "menu-select-left"),
        (ENTER, "menu-accept"),
        (NEWLINE, "menu-accept"),
        ("\x07", "isearch-cancel"),
        (ESC, "isearch-cancel"),
    ])
}

fn visual() -> KeymapTable {
    table_from(&[
        ("d", "vi-visual-delete"),
        ("x", "vi-visual-delete"),
        ("y", "vi-visual-yank"),
        ("c", "vi-visual-change"),
        ("v", "abort"),
        (ESC, "abort"),
    ])
}
