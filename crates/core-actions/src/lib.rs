//! core-actions: commands and the key dispatch engine.
//!
//! Layering:
//! - `registry` interns command names; builtins are a closed enum and hosts
//!   register closures over the `Session`.
//! - `commands` holds the command bodies as free functions over the pieces
//!   of state they touch (a `Line`, the registers, the completion engine).
//! - `engine` owns a `Session`, the compiled keymaps and the completer, and
//!   turns decoded keys into command runs.
//! - `render` snapshots what a host needs to draw a frame.

pub mod commands;
pub mod engine;
pub mod registry;
pub mod render;

pub use engine::{EOF, Engine, INTERRUPT, MAX_MACRO_DEPTH, Step};
pub use registry::{Builtin, Command, CommandRegistry, CustomCommand};
pub use render::{CellView, GroupView, RenderSnapshot, RowView};
