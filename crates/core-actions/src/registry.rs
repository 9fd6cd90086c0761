//! Command registry: names to interned `CommandId`s.
//!
//! Keymap tables name commands by string; compiling a table resolves each
//! name here once so the dispatch hot path only carries ids. Builtins are a
//! closed enum. Hosts add their own commands as closures over the session,
//! and may shadow a builtin by registering under its name (the id is kept,
//! so compiled keymaps stay valid).

use core_keymap::CommandId;
use core_state::Session;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

macro_rules! builtins {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Commands implemented by the engine itself.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Builtin {
            $($variant),+
        }

        impl Builtin {
            pub const ALL: &'static [Builtin] = &[$(Builtin::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Builtin::$variant => $name),+
                }
            }
        }
    };
}

builtins! {
    // motions
    ForwardChar => "forward-char",
    BackwardChar => "backward-char",
    BeginningOfLine => "beginning-of-line",
    EndOfLine => "end-of-line",
    ForwardWord => "forward-word",
    BackwardWord => "backward-word",
    EmacsForwardWord => "emacs-forward-word",
    ForwardWordEnd => "forward-word-end",
    ForwardBlankWord => "forward-blank-word",
    BackwardBlankWord => "backward-blank-word",
    ForwardShellWord => "forward-shell-word",
    BackwardShellWord => "backward-shell-word",
    ViDigitOrBeginningOfLine => "vi-digit-or-beginning-of-line",
    // edits
    SelfInsert => "self-insert",
    BackwardDeleteChar => "backward-delete-char",
    DeleteChar => "delete-char",
    KillLine => "kill-line",
    BackwardKillLine => "backward-kill-line",
    KillWord => "kill-word",
    BackwardKillWord => "backward-kill-word",
    UnixWordRubout => "unix-word-rubout",
    Yank => "yank",
    TransposeChars => "transpose-chars",
    Undo => "undo",
    Redo => "redo",
    AcceptLine => "accept-line",
    ClearLine => "clear-line",
    ViDeleteChar => "vi-delete-char",
    ViPutAfter => "vi-put-after",
    ViPutBefore => "vi-put-before",
    // operators
    DeleteMotion => "delete-motion",
    ChangeMotion => "change-motion",
    YankMotion => "yank-motion",
    // modes
    ViCommandMode => "vi-command-mode",
    ViInsertMode => "vi-insert-mode",
    ViAppendMode => "vi-append-mode",
    ViAppendEol => "vi-append-eol",
    ViInsertBol => "vi-insert-bol",
    ViEditingMode => "vi-editing-mode",
    EmacsEditingMode => "emacs-editing-mode",
    ViVisualMode => "vi-visual-mode",
    ViVisualDelete => "vi-visual-delete",
    ViVisualYank => "vi-visual-yank",
    ViVisualChange => "vi-visual-change",
    DigitArgument => "digit-argument",
    Abort => "abort",
    // completion
    Complete => "complete",
    MenuComplete => "menu-complete",
    MenuCompleteBackward => "menu-complete-backward",
    MenuSelectUp => "menu-select-up",
    MenuSelectDown => "menu-select-down",
    MenuSelectLeft => "menu-select-left",
    MenuSelectRight => "menu-select-right",
    MenuNextTag => "menu-next-tag",
    MenuPrevTag => "menu-prev-tag",
    MenuAccept => "menu-accept",
    MenuCancel => "menu-cancel",
    MenuIncrementalSearch => "menu-incremental-search",
    IsearchCancel => "isearch-cancel",
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.name() == name)
    }

    /// Cursor motions; these also complete a pending operator.
    pub fn is_motion(self) -> bool {
        use Builtin::*;
        matches!(
            self,
            ForwardChar
                | BackwardChar
                | BeginningOfLine
                | EndOfLine
                | ForwardWord
                | BackwardWord
                | EmacsForwardWord
                | ForwardWordEnd
                | ForwardBlankWord
                | BackwardBlankWord
                | ForwardShellWord
                | BackwardShellWord
                | ViDigitOrBeginningOfLine
        )
    }

    pub fn is_operator(self) -> bool {
        matches!(
            self,
            Builtin::DeleteMotion | Builtin::ChangeMotion | Builtin::YankMotion
        )
    }

    /// Commands that drive the completion menu and keep its listing alive.
    pub fn is_completion(self) -> bool {
        use Builtin::*;
        matches!(
            self,
            Complete
                | MenuComplete
                | MenuCompleteBackward
                | MenuSelectUp
                | MenuSelectDown
                | MenuSelectLeft
                | MenuSelectRight
                | MenuNextTag
                | MenuPrevTag
                | MenuAccept
                | MenuCancel
                | MenuIncrementalSearch
                | IsearchCancel
        )
    }

    /// Commands that act on the visual selection rather than ending it.
    pub fn is_visual(self) -> bool {
        matches!(
            self,
            Builtin::ViVisualDelete | Builtin::ViVisualYank | Builtin::ViVisualChange
        )
    }

    /// Undo history navigation is never recorded as an edit.
    pub fn is_history(self) -> bool {
        matches!(self, Builtin::Undo | Builtin::Redo)
    }
}

pub type CustomCommand = Box<dyn FnMut(&mut Session)>;

pub enum Command {
    Builtin(Builtin),
    Custom(CustomCommand),
}

struct Entry {
    name: String,
    command: Command,
}

pub struct CommandRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, CommandId>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.entries.len())
            .finish()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl CommandRegistry {
    /// Registry with no commands at all.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for b in Builtin::ALL {
            registry.insert(b.name(), Command::Builtin(*b));
        }
        registry
    }

    /// Register a custom command. An existing command with the same name is
    /// replaced in place and keeps its id.
    pub fn register<F>(&mut self, name: &str, f: F) -> CommandId
    where
        F: FnMut(&mut Session) + 'static,
    {
        self.insert(name, Command::Custom(Box::new(f)))
    }

    fn insert(&mut self, name: &str, command: Command) -> CommandId {
        if let Some(&id) = self.index.get(name) {
            debug!(target: "input.dispatch", command = name, "command_shadowed");
            self.entries[id.0 as usize].command = command;
            return id;
        }
        let id = CommandId(self.entries.len() as u32);
        self.entries.push(Entry {
            name: name.to_string(),
            command,
        });
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn id(&self, name: &str) -> Option<CommandId> {
        self.index.get(name).copied()
    }

    pub fn name(&self, id: CommandId) -> Option<&str> {
        self.entries.get(id.0 as usize).map(|e| e.name.as_str())
    }

    /// The builtin behind `id`, unless a custom command shadows it.
    pub fn builtin(&self, id: CommandId) -> Option<Builtin> {
        match self.entries.get(id.0 as usize)?.command {
            Command::Builtin(b) => Some(b),
            Command::Custom(_) => None,
        }
    }

    pub(crate) fn command_mut(&mut self, id: CommandId) -> Option<&mut Command> {
        self.entries.get_mut(id.0 as usize).map(|e| &mut e.command)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_round_trip_and_are_unique() {
        let registry = CommandRegistry::with_builtins();
        assert_eq!(registry.len(), Builtin::ALL.len());
        for b in Builtin::ALL {
            assert_eq!(Builtin::from_name(b.name()), Some(*b));
            let id = registry.id(b.name()).unwrap();
            assert_eq!(registry.builtin(id), Some(*b));
        }
    }

    #[test]
    fn custom_command_shadows_builtin_keeping_id() {
        let mut registry = CommandRegistry::with_builtins();
        let before = registry.id("yank").unwrap();
        let after = registry.register("yank", |s: &mut Session| s.hint = Some("custom".into()));
        assert_eq!(before, after);
        assert_eq!(registry.builtin(after), None);
        assert_eq!(registry.len(), Builtin::ALL.len());
    }

    #[test]
    fn new_custom_command_gets_fresh_id() {
        let mut registry = CommandRegistry::with_builtins();
        let id = registry.register("say-hi", |_s: &mut Session| {});
        assert_eq!(id, CommandId(Builtin::ALL.len() as u32));
        assert_eq!(registry.name(id), Some("say-hi"));
        assert!(CommandRegistry::new().is_empty());
    }

    #[test]
    fn classifications_are_disjoint() {
        for b in Builtin::ALL {
            let kinds = [b.is_motion(), b.is_operator(), b.is_completion(), b.is_visual()];
            assert!(kinds.iter().filter(|k| **k).count() <= 1, "{b:?}");
        }
    }
}
