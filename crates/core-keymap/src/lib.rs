//! core-keymap: key-sequence tables and their compiled resolution tries.
//!
//! Design principles:
//! - Tables are plain data (`KeymapTable`: sequence string -> command name or
//!   macro) so they can be loaded from configuration and swapped wholesale.
//! - Before use a table is compiled against a command resolver into a
//!   `MappingTrie` whose terminals hold interned `CommandId`s; the hot
//!   dispatch path never compares command names.
//! - Resolution is pure: it depends only on the pending key buffer. Ambiguity
//!   (an exact match that is also a strict prefix of longer bindings) is
//!   surfaced to the caller, which owns the tie-break policy.
//! - Unknown command names never abort a compile; they are returned as
//!   `KeymapError`s and logged.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

mod defaults;
pub mod notation;
mod trie;

pub use notation::{KeyNotationError, describe, parse_notation};
pub use trie::{MappingTrie, Resolution};

/// Interned command index handed out by the command registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub u32);

/// Uncompiled binding as written in a table or configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingSpec {
    Command(String),
    /// Keys re-fed through dispatch, one code point per key.
    Macro(String),
}

impl BindingSpec {
    pub fn command(name: impl Into<String>) -> Self {
        BindingSpec::Command(name.into())
    }
}

/// Compiled binding stored in trie terminals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Command(CommandId),
    Macro(String),
}

/// Persistent base editing keymap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MainKeymap {
    Emacs,
    ViInsert,
    ViCommand,
}

impl MainKeymap {
    /// Insertion modes self-insert keys that match nothing.
    pub fn is_insertion(self) -> bool {
        matches!(self, MainKeymap::Emacs | MainKeymap::ViInsert)
    }
}

/// Transient keymap matched before the main one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalKeymap {
    MenuSelect,
    Isearch,
    ViOpp,
    Visual,
}

/// Any keymap, used to address tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeymapKind {
    Emacs,
    ViInsert,
    ViCommand,
    MenuSelect,
    Isearch,
    ViOpp,
    Visual,
}

impl KeymapKind {
    pub const ALL: [KeymapKind; 7] = [
        KeymapKind::Emacs,
        KeymapKind::ViInsert,
        KeymapKind::ViCommand,
        KeymapKind::MenuSelect,
        KeymapKind::Isearch,
        KeymapKind::ViOpp,
        KeymapKind::Visual,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KeymapKind::Emacs => "emacs",
            KeymapKind::ViInsert => "vi-insert",
            KeymapKind::ViCommand => "vi-command",
            KeymapKind::MenuSelect => "menu-select",
            KeymapKind::Isearch => "isearch",
            KeymapKind::ViOpp => "vi-opp",
            KeymapKind::Visual => "visual",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for KeymapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<MainKeymap> for KeymapKind {
    fn from(main: MainKeymap) -> Self {
        match main {
            MainKeymap::Emacs => KeymapKind::Emacs,
            MainKeymap::ViInsert => KeymapKind::ViInsert,
            MainKeymap::ViCommand => KeymapKind::ViCommand,
        }
    }
}

impl From<LocalKeymap> for KeymapKind {
    fn from(local: LocalKeymap) -> Self {
        match local {
            LocalKeymap::MenuSelect => KeymapKind::MenuSelect,
            LocalKeymap::Isearch => KeymapKind::Isearch,
            LocalKeymap::ViOpp => KeymapKind::ViOpp,
            LocalKeymap::Visual => KeymapKind::Visual,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeymapError {
    #[error("{keymap}: `{sequence}` is bound to unknown command `{command}`")]
    UnknownCommand {
        keymap: KeymapKind,
        sequence: String,
        command: String,
    },
    #[error("{keymap}: empty key sequence bound to `{binding}`")]
    EmptySequence { keymap: KeymapKind, binding: String },
    #[error(transparent)]
    Notation(#[from] KeyNotationError),
}

impl KeymapError {
    /// Table the error was found in; notation errors belong to none.
    pub fn keymap(&self) -> Option<KeymapKind> {
        match self {
            KeymapError::UnknownCommand { keymap, .. } | KeymapError::EmptySequence { keymap, .. } => {
                Some(*keymap)
            }
            KeymapError::Notation(_) => None,
        }
    }
}

/// Raw key-sequence -> binding table for one keymap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeymapTable {
    bindings: BTreeMap<String, BindingSpec>,
}

impl KeymapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a raw (decoded) key sequence, replacing any earlier binding.
    pub fn bind(&mut self, sequence: impl Into<String>, spec: BindingSpec) {
        self.bindings.insert(sequence.into(), spec);
    }

    /// Convenience for `bind(seq, BindingSpec::Command(name))`.
    pub fn bind_command(&mut self, sequence: impl Into<String>, command: &str) {
        self.bind(sequence, BindingSpec::command(command));
    }

    /// Bind a sequence written in inputrc-like notation (`\C-a`, `<up>`).
    pub fn bind_notation(&mut self, notation: &str, spec: BindingSpec) -> Result<(), KeymapError> {
        let sequence = parse_notation(notation)?;
        self.bind(sequence, spec);
        Ok(())
    }

    pub fn unbind(&mut self, sequence: &str) -> Option<BindingSpec> {
        self.bindings.remove(sequence)
    }

    pub fn get(&self, sequence: &str) -> Option<&BindingSpec> {
        self.bindings.get(sequence)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindingSpec)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overlay `other` on top of this table (other wins on conflicts).
    pub fn merge(&mut self, other: &KeymapTable) {
        for (seq, spec) in other.iter() {
            self.bind(seq, spec.clone());
        }
    }
}

/// A compiled keymap: resolution trie plus the errors met while compiling.
#[derive(Debug)]
pub struct CompiledKeymap {
    pub kind: KeymapKind,
    pub trie: MappingTrie,
}

impl CompiledKeymap {
    /// Compile `table`, resolving command names through `resolve`. Bindings
    /// with unknown commands or empty sequences are skipped and reported.
    pub fn compile<F>(kind: KeymapKind, table: &KeymapTable, resolve: F) -> (Self, Vec<KeymapError>)
    where
        F: Fn(&str) -> Option<CommandId>,
    {
        let mut entries = Vec::with_capacity(table.len());
        let mut errors = Vec::new();
        for (seq, spec) in table.iter() {
            if seq.is_empty() {
                errors.push(KeymapError::EmptySequence {
                    keymap: kind,
                    binding: format!("{spec:?}"),
                });
                continue;
            }
            let binding = match spec {
                BindingSpec::Command(name) => match resolve(name) {
                    Some(id) => Binding::Command(id),
                    None => {
                        warn!(target: "input.map", keymap = %kind, sequence = %describe(seq), command = %name, "unknown_command");
                        errors.push(KeymapError::UnknownCommand {
                            keymap: kind,
                            sequence: describe(seq),
                            command: name.clone(),
                        });
                        continue;
                    }
                },
                BindingSpec::Macro(keys) => Binding::Macro(keys.clone()),
            };
            entries.push((seq.to_string(), binding));
        }
        debug!(target: "input.map", keymap = %kind, bindings = entries.len(), skipped = errors.len(), "keymap_compiled");
        (
            Self {
                kind,
                trie: MappingTrie::build(entries),
            },
            errors,
        )
    }

    pub fn resolve(&self, pending: &str) -> Resolution {
        self.trie.resolve(pending)
    }
}

/// One table per keymap kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeymapSet {
    tables: BTreeMap<KeymapKind, KeymapTable>,
}

impl Default for KeymapSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KeymapSet {
    /// Tables with no bindings at all.
    pub fn empty() -> Self {
        Self {
            tables: KeymapKind::ALL
                .into_iter()
                .map(|k| (k, KeymapTable::new()))
                .collect(),
        }
    }

    /// The builtin Emacs / Vi / menu / isearch tables.
    pub fn builtin() -> Self {
        Self {
            tables: KeymapKind::ALL
                .into_iter()
                .map(|k| (k, defaults::table(k)))
                .collect(),
        }
    }

    pub fn table(&self, kind: KeymapKind) -> &KeymapTable {
        // Every kind is inserted at construction and never removed.
        &self.tables[&kind]
    }

    pub fn table_mut(&mut self, kind: KeymapKind) -> &mut KeymapTable {
        self.tables.entry(kind).or_default()
    }

    pub fn set_table(&mut self, kind: KeymapKind, table: KeymapTable) {
        self.tables.insert(kind, table);
    }
}
