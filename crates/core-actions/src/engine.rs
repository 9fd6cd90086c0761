//! Key dispatch engine.
//!
//! `Engine::feed` takes one decoded key (a printable character or a whole
//! escape sequence) at a time:
//! 1. `C-c` and `C-d` are handled before any keymap lookup.
//! 2. A no-space suffix armed by the last completion accept sees the key.
//! 3. The key joins the pending buffer, which is matched against the local
//!    keymap (if any) and then the main keymap.
//! 4. An exact match runs; a prefix waits for more keys; an ambiguous match
//!    waits too, except for a lone escape which is never left hanging.
//! 5. Unmatched printable keys self-insert in the insertion keymaps;
//!    control characters and unbound escape sequences are dropped.
//!
//! After every key an active incremental search re-filters the listing.

use crate::commands::complete::{self, Transition};
use crate::commands::mode::{self, InsertAt};
use crate::commands::operator::{self, OperatorKind};
use crate::commands::{edit, motion};
use crate::registry::{Builtin, Command, CommandRegistry};
use core_completion::{Completer, Completions, IsearchFilter};
use core_keymap::notation::ESC;
use core_keymap::{
    Binding, CommandId, CompiledKeymap, KeymapError, KeymapKind, KeymapSet, KeymapTable,
    LocalKeymap, MainKeymap, Resolution, describe,
};
use core_state::{EditSnapshot, MAX_COUNT, Outcome, PendingOperator, Session};
use core_text::motion::whole_line;
use std::collections::BTreeMap;
use std::mem;
use tracing::{debug, trace, warn};

/// `C-c`
pub const INTERRUPT: &str = "\x03";
/// `C-d`
pub const EOF: &str = "\x04";
/// Macros may expand to other macros, but not forever.
pub const MAX_MACRO_DEPTH: usize = 16;

/// What a single key did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The key extended a pending sequence.
    Pending,
    /// A command ran, the key self-inserted or it was dropped.
    Handled,
    /// The line is finished.
    Done(Outcome),
}

struct NoCompletions;

impl Completer for NoCompletions {
    fn complete(&mut self, _line: &[char], _cursor: usize) -> Completions {
        Completions::new()
    }
}

enum OperatorSpan {
    Motion(Builtin),
    /// `dd`, `cc`, `yy`
    Line,
}

pub struct Engine {
    session: Session,
    registry: CommandRegistry,
    keymaps: KeymapSet,
    compiled: BTreeMap<KeymapKind, CompiledKeymap>,
    errors: Vec<KeymapError>,
    completer: Box<dyn Completer>,
    pending: String,
    /// Keys that resolved to the command being run.
    last_keys: String,
    last_command: Option<CommandId>,
    macro_depth: usize,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("session", &self.session)
            .field("registry", &self.registry)
            .field("pending", &describe(&self.pending))
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(session: Session, keymaps: KeymapSet) -> Self {
        Self::with_registry(session, keymaps, CommandRegistry::with_builtins())
    }

    pub fn with_registry(session: Session, keymaps: KeymapSet, registry: CommandRegistry) -> Self {
        let mut engine = Self {
            session,
            registry,
            keymaps,
            compiled: BTreeMap::new(),
            errors: Vec::new(),
            completer: Box::new(NoCompletions),
            pending: String::new(),
            last_keys: String::new(),
            last_command: None,
            macro_depth: 0,
        };
        engine.recompile();
        engine
    }

    pub fn with_completer(mut self, completer: impl Completer + 'static) -> Self {
        self.completer = Box::new(completer);
        self
    }

    pub fn set_completer(&mut self, completer: impl Completer + 'static) {
        self.completer = Box::new(completer);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn keymaps(&self) -> &KeymapSet {
        &self.keymaps
    }

    /// Bindings dropped by the last compile.
    pub fn keymap_errors(&self) -> &[KeymapError] {
        &self.errors
    }

    /// Keys typed so far toward an unfinished sequence.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn last_command(&self) -> Option<&str> {
        self.last_command.and_then(|id| self.registry.name(id))
    }

    /// Register a host command and recompile so tables naming it bind.
    pub fn register_command<F>(&mut self, name: &str, f: F) -> CommandId
    where
        F: FnMut(&mut Session) + 'static,
    {
        let id = self.registry.register(name, f);
        self.recompile();
        id
    }

    /// Replace one table. Returns the errors found compiling it.
    pub fn set_keymap(&mut self, kind: KeymapKind, table: KeymapTable) -> Vec<KeymapError> {
        self.keymaps.set_table(kind, table);
        self.recompile();
        self.errors
            .iter()
            .filter(|e| e.keymap() == Some(kind))
            .cloned()
            .collect()
    }

    /// Swap in a whole new set of tables, e.g. after a config reload.
    pub fn reload(&mut self, keymaps: KeymapSet) -> &[KeymapError] {
        self.keymaps = keymaps;
        self.pending.clear();
        self.recompile();
        &self.errors
    }

    fn recompile(&mut self) {
        let registry = &self.registry;
        self.errors.clear();
        for kind in KeymapKind::ALL {
            let (compiled, errors) =
                CompiledKeymap::compile(kind, self.keymaps.table(kind), |name| registry.id(name));
            self.compiled.insert(kind, compiled);
            self.errors.extend(errors);
        }
    }

    /// Start the next line, keeping modes and registers.
    pub fn next_line(&mut self) {
        self.pending.clear();
        self.session.reset_line();
    }

    /// Feed each character of `keys` as its own key; stops at the first
    /// finished line.
    pub fn feed_str(&mut self, keys: &str) -> Step {
        let mut step = Step::Handled;
        let mut buf = [0u8; 4];
        for c in keys.chars() {
            step = self.feed(c.encode_utf8(&mut buf));
            if matches!(step, Step::Done(_)) {
                break;
            }
        }
        step
    }

    pub fn feed(&mut self, key: &str) -> Step {
        if key.is_empty() {
            return Step::Handled;
        }
        trace!(target: "input.dispatch", key = %describe(key), "key");
        if let Some(step) = self.interrupt(key) {
            return step;
        }
        if self.pending.is_empty() && self.session.completion.pending_suffix().is_some() {
            let session = &mut self.session;
            session.completion.consume_suffix(session.line.line_mut(), key);
        }
        self.pending.push_str(key);
        let step = self.resolve();
        self.refresh_isearch();
        step
    }

    fn interrupt(&mut self, key: &str) -> Option<Step> {
        if key == INTERRUPT {
            self.pending.clear();
            if self.session.local.is_some() {
                self.session.cancel_local();
                return Some(Step::Handled);
            }
            debug!(target: "input.dispatch", "interrupted");
            self.session.completion.reset(&mut self.session.line);
            return Some(Step::Done(Outcome::Interrupted));
        }
        if key == EOF && self.pending.is_empty() {
            if self.session.local.is_some() {
                self.session.cancel_local();
                return Some(Step::Handled);
            }
            if self.session.line().is_empty() {
                debug!(target: "input.dispatch", "eof");
                return Some(Step::Done(Outcome::Eof));
            }
        }
        None
    }

    fn lookup(&self, kind: KeymapKind) -> Resolution {
        self.compiled
            .get(&kind)
            .map_or(Resolution::NoMatch, |c| c.resolve(&self.pending))
    }

    /// The keymap behind the local one. Typing into a search from Vi command
    /// mode still needs an insertion keymap.
    fn effective_main(&self) -> MainKeymap {
        match self.session.local {
            Some(LocalKeymap::Isearch) if !self.session.main.is_insertion() => MainKeymap::ViInsert,
            _ => self.session.main,
        }
    }

    fn resolve(&mut self) -> Step {
        if let Some(local) = self.session.local {
            match self.lookup(local.into()) {
                Resolution::Exact(binding) => return self.run_binding(binding),
                _ if self.pending == ESC => {
                    self.pending.clear();
                    debug!(target: "input.dispatch", ?local, "escape_cancels_local");
                    self.session.cancel_local();
                    return Step::Handled;
                }
                Resolution::Ambiguous(_) | Resolution::Prefix => return Step::Pending,
                Resolution::NoMatch => self.local_fallthrough(local),
            }
        }
        let main = self.effective_main();
        match self.lookup(main.into()) {
            Resolution::Exact(binding) => self.run_binding(binding),
            Resolution::Ambiguous(binding) if self.pending == ESC => self.run_binding(binding),
            Resolution::Ambiguous(_) | Resolution::Prefix => Step::Pending,
            Resolution::NoMatch => self.unmatched(main),
        }
    }

    fn local_fallthrough(&mut self, local: LocalKeymap) {
        if local == LocalKeymap::MenuSelect {
            trace!(target: "input.dispatch", keys = %describe(&self.pending), "menu_fallthrough");
            self.session.cancel_local();
        }
    }

    fn unmatched(&mut self, main: MainKeymap) -> Step {
        let keys = mem::take(&mut self.pending);
        // An unbound terminal sequence is one key; its tail is not text.
        if main.is_insertion() && !keys.starts_with(ESC) {
            let text: String = keys.chars().filter(|c| !c.is_control()).collect();
            if !text.is_empty()
                && let Some(id) = self.registry.id(Builtin::SelfInsert.name())
            {
                self.last_keys = text;
                return self.run_command(id);
            }
        }
        trace!(target: "input.dispatch", keys = %describe(&keys), "unbound_dropped");
        if self.session.local == Some(LocalKeymap::ViOpp) {
            self.session.cancel_local();
        }
        Step::Handled
    }

    fn run_binding(&mut self, binding: Binding) -> Step {
        match binding {
            Binding::Command(id) => {
                self.last_keys = mem::take(&mut self.pending);
                self.run_command(id)
            }
            Binding::Macro(keys) => {
                self.pending.clear();
                self.run_macro(&keys)
            }
        }
    }

    fn run_macro(&mut self, keys: &str) -> Step {
        if self.macro_depth >= MAX_MACRO_DEPTH {
            warn!(target: "input.dispatch", depth = self.macro_depth, "macro_depth_exceeded");
            return Step::Handled;
        }
        self.macro_depth += 1;
        trace!(target: "input.dispatch", keys = %describe(keys), "macro");
        let step = self.feed_str(keys);
        self.macro_depth -= 1;
        step
    }

    fn run_command(&mut self, id: CommandId) -> Step {
        self.last_command = Some(id);
        let builtin = self.registry.builtin(id);
        trace!(target: "input.dispatch", command = self.registry.name(id).unwrap_or("?"), "run");
        self.session.hint = None;

        let record = self.session.isearch.is_none() && !builtin.is_some_and(Builtin::is_history);
        let before = record.then(|| {
            let line = self.session.line();
            (EditSnapshot::capture(line), line.revision())
        });
        let self_insert = builtin == Some(Builtin::SelfInsert);
        if !self_insert {
            self.session.end_insert_run();
        }

        let step = self.execute(id, builtin);

        if let Some((snapshot, revision)) = before {
            self.session.record_edit(snapshot, revision, self_insert);
        }
        match self.session.outcome.take() {
            Some(outcome) => Step::Done(outcome),
            None => step,
        }
    }

    fn execute(&mut self, id: CommandId, builtin: Option<Builtin>) -> Step {
        let local = self.session.local;
        match local {
            Some(LocalKeymap::ViOpp) => match builtin {
                Some(Builtin::DigitArgument) => {}
                Some(Builtin::ViDigitOrBeginningOfLine) if self.session.count.is_some() => {}
                Some(b) if b.is_motion() => return self.finish_operator(OperatorSpan::Motion(b)),
                Some(b)
                    if b.is_operator()
                        && self.session.operators.last().map(|op| op.command) == Some(id) =>
                {
                    return self.finish_operator(OperatorSpan::Line);
                }
                _ => {
                    debug!(target: "input.operator", "operator_cancelled");
                    self.session.cancel_local();
                    return Step::Handled;
                }
            },
            Some(LocalKeymap::Visual) => {
                let keeps = builtin.is_some_and(|b| {
                    b.is_motion() || b.is_visual() || b == Builtin::DigitArgument
                });
                if !keeps {
                    self.session.cancel_local();
                }
            }
            Some(LocalKeymap::MenuSelect) | Some(LocalKeymap::Isearch) => {}
            None => {
                if !builtin.is_some_and(Builtin::is_completion) && self.session.completion.is_active() {
                    self.session.completion.reset(&mut self.session.line);
                }
            }
        }

        match builtin {
            Some(b) => self.run_builtin(b, id),
            None => {
                if let Some(Command::Custom(f)) = self.registry.command_mut(id) {
                    f(&mut self.session);
                }
                Step::Handled
            }
        }
    }

    fn finish_operator(&mut self, span: OperatorSpan) -> Step {
        let Some(op) = self.session.operators.pop() else {
            self.session.set_local(None);
            return Step::Handled;
        };
        if self.session.operators.is_empty() {
            self.session.set_local(None);
        }
        let Some(kind) = self.registry.builtin(op.command).and_then(OperatorKind::from_builtin) else {
            return Step::Handled;
        };
        let count = op.count.saturating_mul(self.session.take_count()).min(MAX_COUNT);
        let session = &mut self.session;
        let line = session.line.line_mut();
        let (chars, cursor) = (line.chars(), line.cursor());
        let range = match span {
            OperatorSpan::Motion(b) => motion::span(b, chars, cursor, count),
            OperatorSpan::Line => {
                let mut range = whole_line(chars, cursor);
                for _ in 1..count {
                    if range.end >= chars.len() {
                        break;
                    }
                    range.end = whole_line(chars, range.end).end;
                }
                // `cc` keeps the row itself.
                if kind.enters_insert() && range.end > range.start && chars.get(range.end - 1) == Some(&'\n') {
                    range.end -= 1;
                }
                Some(range)
            }
        };
        let Some(range) = range else {
            return Step::Handled;
        };
        operator::apply(kind, line, &mut session.registers, range);
        if kind.enters_insert() {
            session.set_main(MainKeymap::ViInsert);
        } else if session.main == MainKeymap::ViCommand {
            edit::clamp_to_row(session.line.line_mut());
        }
        Step::Handled
    }

    fn transition(&mut self, t: Transition) {
        let session = &mut self.session;
        match t {
            Transition::Stay => {}
            // Moving through the matches keeps the search open.
            Transition::Enter(LocalKeymap::MenuSelect) if session.local == Some(LocalKeymap::Isearch) => {}
            Transition::Enter(LocalKeymap::Isearch) => {
                if session.isearch.is_none() {
                    session.isearch = Some(IsearchFilter::new(session.smart_case));
                }
                session.set_local(Some(LocalKeymap::Isearch));
            }
            Transition::Enter(local) => session.set_local(Some(local)),
            Transition::Exit => {
                session.isearch = None;
                session.set_local(None);
            }
        }
    }

    fn menu_select(&mut self, dx: isize, dy: isize) {
        let s = &mut self.session;
        let t = complete::menu_select(&mut s.completion, &mut s.line, self.completer.as_mut(), dx, dy);
        self.transition(t);
    }

    fn run_builtin(&mut self, b: Builtin, id: CommandId) -> Step {
        let s = &mut self.session;
        match b {
            b if b.is_motion() => {
                if b == Builtin::ViDigitOrBeginningOfLine && s.count.is_some() {
                    s.push_digit(0);
                    return Step::Handled;
                }
                let count = s.take_count();
                let vi_command = s.main == MainKeymap::ViCommand && s.isearch.is_none();
                let line = s.edit_target();
                if let Some(to) = motion::target(b, line.chars(), line.cursor(), count) {
                    line.set_cursor(to);
                }
                if vi_command {
                    edit::clamp_to_row(line);
                }
            }
            Builtin::SelfInsert => {
                let count = s.take_count();
                edit::self_insert(s.edit_target(), &self.last_keys, count);
            }
            Builtin::BackwardDeleteChar => {
                let count = s.take_count();
                edit::backward_delete_char(s.edit_target(), count);
            }
            Builtin::DeleteChar => {
                let count = s.take_count();
                edit::delete_char(s.edit_target(), count);
            }
            Builtin::KillLine => {
                let (line, registers) = s.edit_parts();
                edit::kill_line(line, registers);
            }
            Builtin::BackwardKillLine => {
                let (line, registers) = s.edit_parts();
                edit::backward_kill_line(line, registers);
            }
            Builtin::KillWord => {
                let count = s.take_count();
                let (line, registers) = s.edit_parts();
                edit::kill_word(line, registers, count);
            }
            Builtin::BackwardKillWord => {
                let count = s.take_count();
                let (line, registers) = s.edit_parts();
                edit::backward_kill_word(line, registers, count);
            }
            Builtin::UnixWordRubout => {
                let count = s.take_count();
                let (line, registers) = s.edit_parts();
                edit::unix_word_rubout(line, registers, count);
            }
            Builtin::Yank => {
                let count = s.take_count();
                let (line, registers) = s.edit_parts();
                edit::yank(line, registers, count);
            }
            Builtin::TransposeChars => edit::transpose_chars(s.edit_target()),
            Builtin::ClearLine => edit::clear_line(s.edit_target()),
            Builtin::Undo | Builtin::Redo => {
                let count = s.take_count();
                for _ in 0..count {
                    let moved = if b == Builtin::Undo { s.undo() } else { s.redo() };
                    if !moved {
                        s.hint = Some(format!("nothing to {}", b.name()));
                        break;
                    }
                }
            }
            Builtin::AcceptLine => {
                if matches!(s.local, Some(LocalKeymap::MenuSelect) | Some(LocalKeymap::Isearch)) {
                    return self.run_builtin(Builtin::MenuAccept, id);
                }
                s.completion.reset(&mut s.line);
                let text = s.line().to_string();
                debug!(target: "input.dispatch", chars = text.chars().count(), "accept_line");
                s.outcome = Some(Outcome::Accepted(text));
            }
            Builtin::ViDeleteChar => {
                let count = s.take_count();
                let (line, registers) = s.edit_parts();
                edit::vi_delete_char(line, registers, count);
            }
            Builtin::ViPutAfter | Builtin::ViPutBefore => {
                let count = s.take_count();
                let (line, registers) = s.edit_parts();
                edit::vi_put(line, registers, b == Builtin::ViPutAfter, count);
            }
            Builtin::DeleteMotion | Builtin::ChangeMotion | Builtin::YankMotion => {
                let count = s.take_count();
                s.operators.push(PendingOperator { command: id, count });
                s.set_local(Some(LocalKeymap::ViOpp));
            }
            Builtin::ViCommandMode => mode::vi_command(s),
            Builtin::ViInsertMode => mode::vi_insert(s, InsertAt::Cursor),
            Builtin::ViAppendMode => mode::vi_insert(s, InsertAt::After),
            Builtin::ViAppendEol => mode::vi_insert(s, InsertAt::Eol),
            Builtin::ViInsertBol => mode::vi_insert(s, InsertAt::Bol),
            Builtin::ViEditingMode => s.set_main(MainKeymap::ViInsert),
            Builtin::EmacsEditingMode => s.set_main(MainKeymap::Emacs),
            Builtin::ViVisualMode => mode::visual_start(s),
            Builtin::ViVisualDelete | Builtin::ViVisualYank | Builtin::ViVisualChange => {
                if let Some(kind) = OperatorKind::from_builtin(b) {
                    mode::visual_apply(s, kind);
                }
            }
            Builtin::DigitArgument => {
                if let Some(digit) = self.last_keys.chars().last().and_then(|c| c.to_digit(10)) {
                    s.push_digit(digit);
                }
            }
            Builtin::Abort => mode::abort(s),
            Builtin::Complete => {
                let t = complete::complete(&mut s.completion, &mut s.line, self.completer.as_mut());
                self.transition(t);
            }
            Builtin::MenuComplete => self.menu_select(1, 0),
            Builtin::MenuCompleteBackward => self.menu_select(-1, 0),
            Builtin::MenuSelectUp => self.menu_select(0, -1),
            Builtin::MenuSelectDown => self.menu_select(0, 1),
            Builtin::MenuSelectLeft => self.menu_select(-1, 0),
            Builtin::MenuSelectRight => self.menu_select(1, 0),
            Builtin::MenuNextTag | Builtin::MenuPrevTag => {
                let t = complete::menu_tag(&mut s.completion, &mut s.line, b == Builtin::MenuNextTag);
                self.transition(t);
            }
            Builtin::MenuAccept => {
                let t = complete::menu_accept(&mut s.completion, &mut s.line);
                self.transition(t);
            }
            Builtin::MenuCancel | Builtin::IsearchCancel => {
                let t = complete::menu_cancel(&mut s.completion, &mut s.line);
                self.transition(t);
            }
            Builtin::MenuIncrementalSearch => {
                let t = complete::start_isearch(&mut s.completion, &mut s.line, self.completer.as_mut());
                self.transition(t);
            }
            // Every motion is caught by the first arm.
            _ => {}
        }
        Step::Handled
    }

    fn refresh_isearch(&mut self) {
        if let Some(filter) = self.session.isearch.as_mut() {
            filter.refresh(&mut self.session.completion, &mut self.session.line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_keymap::BindingSpec;
    use core_state::SessionOptions;

    fn engine(main: MainKeymap) -> Engine {
        let session = Session::new(SessionOptions {
            main,
            ..SessionOptions::default()
        });
        Engine::new(session, KeymapSet::builtin())
    }

    #[test]
    fn prefix_waits_then_runs() {
        let mut e = engine(MainKeymap::Emacs);
        e.feed_str("ab");
        assert_eq!(e.feed("\x18"), Step::Pending);
        assert_eq!(e.pending(), "\x18");
        assert_eq!(e.feed("\x15"), Step::Handled);
        assert_eq!(e.pending(), "");
        assert_eq!(e.last_command(), Some("undo"));
    }

    #[test]
    fn lone_escape_runs_ambiguous_binding() {
        let mut e = engine(MainKeymap::ViInsert);
        e.feed_str("abc");
        assert_eq!(e.feed(ESC), Step::Handled);
        assert_eq!(e.session().main, MainKeymap::ViCommand);
        assert_eq!(e.session().line().cursor(), 2);
    }

    #[test]
    fn control_keys_never_self_insert() {
        let mut e = engine(MainKeymap::Emacs);
        e.feed("\x1c");
        assert_eq!(e.session().line().to_string(), "");
        assert_eq!(e.pending(), "");
    }

    #[test]
    fn unknown_command_is_reported_not_fatal() {
        let mut keymaps = KeymapSet::builtin();
        keymaps
            .table_mut(KeymapKind::Emacs)
            .bind("\x0f", BindingSpec::command("no-such-command"));
        let e = Engine::new(Session::default(), keymaps);
        assert_eq!(e.keymap_errors().len(), 1);
    }

    #[test]
    fn runaway_macro_is_cut_off() {
        let mut e = engine(MainKeymap::Emacs);
        let mut table = e.keymaps().table(KeymapKind::Emacs).clone();
        table.bind("q", BindingSpec::Macro("xq".into()));
        e.set_keymap(KeymapKind::Emacs, table);
        e.feed("q");
        assert_eq!(e.session().line().to_string(), "x".repeat(MAX_MACRO_DEPTH));
    }
}
