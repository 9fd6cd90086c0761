#![allow(dead_code)] // Shared across many integration tests; each test binary uses a subset of helpers.

use core_actions::Engine;
use core_completion::{Completer, Completions};
use core_keymap::{KeymapSet, MainKeymap};
use core_state::{Session, SessionOptions};
use core_text::Line;
use core_text::motion::word_before;

pub fn engine(main: MainKeymap) -> Engine {
    let session = Session::new(SessionOptions {
        main,
        ..SessionOptions::default()
    });
    Engine::new(session, KeymapSet::builtin())
}

/// Engine whose committed line starts as `text` with the cursor at `cursor`.
pub fn engine_at(main: MainKeymap, text: &str, cursor: usize) -> Engine {
    let mut e = engine(main);
    e.session_mut().line.replace(Line::with_cursor(text, cursor));
    e
}

/// Completer offering the `words` that start with the word before the cursor.
pub fn words(words: &[&str]) -> impl Completer + 'static {
    let words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
    move |line: &[char], cursor: usize| {
        let prefix: String = line[word_before(line, cursor)].iter().collect();
        Completions::from_values(words.iter().filter(|w| w.starts_with(&prefix)).cloned())
    }
}

pub fn text(e: &Engine) -> String {
    e.session().line().to_string()
}

/// What the user sees, previewed candidate included.
pub fn shown(e: &Engine) -> String {
    e.session().line.logical().to_string()
}

pub fn cursor(e: &Engine) -> usize {
    e.session().line().cursor()
}
