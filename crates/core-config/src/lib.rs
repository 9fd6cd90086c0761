//! Configuration loading and parsing.
//!
//! `overline.toml` is looked up in the working directory, then in the
//! platform config directory (`<config_dir>/overline/overline.toml`). A
//! missing or unparsable file yields the defaults; a parse failure is logged
//! under the `config` target. Unknown fields are ignored so older binaries
//! tolerate newer files.
//!
//! Keymap overrides live under `[keymap.<name>]`, one entry per key in
//! inputrc-like notation. Values are a command name or `{ macro = "keys" }`.
//! They merge over the builtin tables.

use anyhow::{Context, Result};
use core_completion::CompletionOptions;
use core_keymap::{BindingSpec, KeymapError, KeymapKind, KeymapSet, MainKeymap};
use core_state::SessionOptions;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const FILE_NAME: &str = "overline.toml";

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EditingMode {
    #[default]
    Emacs,
    Vi,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct EditorConfig {
    #[serde(default)]
    pub mode: EditingMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "CompletionConfig::default_width")]
    pub width: usize,
    #[serde(default = "CompletionConfig::default_margin")]
    pub margin: usize,
    #[serde(default = "CompletionConfig::default_max_rows")]
    pub max_rows: usize,
    #[serde(default = "CompletionConfig::default_map_max_rows")]
    pub map_max_rows: usize,
    #[serde(default)]
    pub auto_space: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            margin: Self::default_margin(),
            max_rows: Self::default_max_rows(),
            map_max_rows: Self::default_map_max_rows(),
            auto_space: false,
        }
    }
}

impl CompletionConfig {
    const fn default_width() -> usize {
        80
    }
    const fn default_margin() -> usize {
        2
    }
    const fn default_max_rows() -> usize {
        10
    }
    const fn default_map_max_rows() -> usize {
        8
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IsearchConfig {
    #[serde(default = "IsearchConfig::default_smart_case")]
    pub smart_case: bool,
}

impl Default for IsearchConfig {
    fn default() -> Self {
        Self {
            smart_case: Self::default_smart_case(),
        }
    }
}

impl IsearchConfig {
    const fn default_smart_case() -> bool {
        true
    }
}

/// Right-hand side of a keymap entry.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum BindingValue {
    Command(String),
    Macro {
        #[serde(rename = "macro")]
        keys: String,
    },
}

impl From<&BindingValue> for BindingSpec {
    fn from(value: &BindingValue) -> Self {
        match value {
            BindingValue::Command(name) => BindingSpec::Command(name.clone()),
            BindingValue::Macro { keys } => BindingSpec::Macro(keys.clone()),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub isearch: IsearchConfig,
    /// keymap name -> key notation -> binding
    #[serde(default)]
    pub keymap: BTreeMap<String, BTreeMap<String, BindingValue>>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // original file string (optional)
    pub path: Option<PathBuf>,
    pub file: ConfigFile, // parsed (or default) data
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("overline").join(FILE_NAME);
    }
    PathBuf::from(FILE_NAME)
}

/// Parse configuration text.
pub fn parse(content: &str) -> Result<ConfigFile> {
    toml::from_str::<ConfigFile>(content).context("parsing overline configuration")
}

/// Load from `path` (or the discovered location). Missing or invalid files
/// fall back to defaults.
pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_absent_using_defaults");
        return Ok(Config::default());
    };
    match parse(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), keymaps = file.keymap.len(), "config_loaded");
            Ok(Config {
                raw: Some(content),
                path: Some(path),
                file,
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %format!("{e:#}"), "config_parse_failed");
            Ok(Config::default())
        }
    }
}

impl Config {
    pub fn main_keymap(&self) -> MainKeymap {
        match self.file.editor.mode {
            EditingMode::Emacs => MainKeymap::Emacs,
            EditingMode::Vi => MainKeymap::ViInsert,
        }
    }

    pub fn completion_options(&self) -> CompletionOptions {
        let c = &self.file.completion;
        CompletionOptions {
            width: c.width.max(1),
            margin: c.margin,
            max_rows: c.max_rows.max(1),
            map_max_rows: c.map_max_rows.max(1),
            auto_space: c.auto_space,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            main: self.main_keymap(),
            completion: self.completion_options(),
            smart_case: self.file.isearch.smart_case,
        }
    }

    /// Builtin tables with the `[keymap.*]` overrides merged on top.
    /// Malformed key notation is reported and skipped; unknown keymap names
    /// are logged and skipped.
    pub fn keymaps(&self) -> (KeymapSet, Vec<KeymapError>) {
        let mut set = KeymapSet::builtin();
        let mut errors = Vec::new();
        for (name, entries) in &self.file.keymap {
            let Some(kind) = KeymapKind::from_name(name) else {
                warn!(target: "config", keymap = %name, "unknown_keymap");
                continue;
            };
            let table = set.table_mut(kind);
            for (notation, value) in entries {
                if let Err(e) = table.bind_notation(notation, value.into()) {
                    warn!(target: "config", keymap = %name, %notation, error = %e, "binding_rejected");
                    errors.push(e);
                }
            }
        }
        (set, errors)
    }
}
