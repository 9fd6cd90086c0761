mod common;

use common::{cursor, engine, engine_at, text};
use core_actions::{EOF, INTERRUPT, Step};
use core_keymap::notation::{BACKSPACE, ENTER, LEFT, meta};
use core_keymap::{LocalKeymap, MainKeymap};
use core_state::Outcome;

#[test]
fn typing_and_accept_line() {
    let mut e = engine(MainKeymap::Emacs);
    assert_eq!(e.feed_str("echo hi"), Step::Handled);
    assert_eq!(e.feed(ENTER), Step::Done(Outcome::Accepted("echo hi".into())));
}

#[test]
fn cursor_motions_and_kills() {
    let mut e = engine_at(MainKeymap::Emacs, "hello big world", 15);
    e.feed(&meta("b"));
    assert_eq!(cursor(&e), 10);
    e.feed("\x0b");
    assert_eq!(text(&e), "hello big ");
    e.feed("\x01");
    assert_eq!(cursor(&e), 0);
    e.feed(&meta("d"));
    assert_eq!(text(&e), " big ");
    e.feed("\x05");
    e.feed("\x19");
    assert_eq!(text(&e), " big hello");
}

#[test]
fn numeric_argument_repeats_self_insert() {
    let mut e = engine(MainKeymap::Emacs);
    e.feed(&meta("3"));
    e.feed("x");
    assert_eq!(text(&e), "xxx");
    assert_eq!(e.session().count, None);
}

#[test]
fn unix_word_rubout_and_backspace() {
    let mut e = engine(MainKeymap::Emacs);
    e.feed_str("cd ../some-dir");
    e.feed("\x17");
    assert_eq!(text(&e), "cd ");
    e.feed(BACKSPACE);
    assert_eq!(text(&e), "cd");
    e.feed(LEFT);
    e.feed("\x14");
    assert_eq!(text(&e), "dc");
}

#[test]
fn self_inserts_coalesce_into_one_undo_step() {
    let mut e = engine(MainKeymap::Emacs);
    e.feed_str("foo bar");
    e.feed("\x17");
    assert_eq!(text(&e), "foo ");
    assert_eq!(e.session().undo_depth(), 2);

    e.feed("\x1f");
    assert_eq!(text(&e), "foo bar");
    e.feed_str("\x18\x15");
    assert_eq!(text(&e), "");
    e.feed("\x1f");
    assert_eq!(e.session().hint(), Some("nothing to undo"));

    e.feed(&meta("/"));
    assert_eq!(text(&e), "foo bar");
}

#[test]
fn motion_ends_insert_run() {
    let mut e = engine(MainKeymap::Emacs);
    e.feed_str("ab");
    e.feed("\x02");
    e.feed("c");
    assert_eq!(text(&e), "acb");
    e.feed("\x1f");
    assert_eq!(text(&e), "ab");
}

#[test]
fn interrupt_finishes_the_line() {
    let mut e = engine(MainKeymap::Emacs);
    e.feed_str("partial");
    assert_eq!(e.feed(INTERRUPT), Step::Done(Outcome::Interrupted));
    e.next_line();
    assert_eq!(text(&e), "");
    assert_eq!(e.session().undo_depth(), 0);
}

#[test]
fn eof_only_on_empty_line() {
    let mut e = engine_at(MainKeymap::Emacs, "ab", 0);
    assert_eq!(e.feed(EOF), Step::Handled);
    assert_eq!(text(&e), "b");
    e.feed(EOF);
    assert_eq!(e.feed(EOF), Step::Done(Outcome::Eof));
}

#[test]
fn interrupt_inside_prefix_discards_it() {
    let mut e = engine(MainKeymap::Emacs);
    assert_eq!(e.feed("\x18"), Step::Pending);
    assert_eq!(e.feed(INTERRUPT), Step::Done(Outcome::Interrupted));
    assert_eq!(e.pending(), "");
}

#[test]
fn switching_to_vi_and_back() {
    let mut e = engine(MainKeymap::Emacs);
    e.feed_str("\x18\x16");
    assert_eq!(e.session().main, MainKeymap::ViInsert);
    e.feed("\x1b");
    assert_eq!(e.session().main, MainKeymap::ViCommand);
    e.feed("\x05");
    assert_eq!(e.session().main, MainKeymap::Emacs);
    assert_eq!(e.session().local, None::<LocalKeymap>);
}
