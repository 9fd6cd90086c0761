mod common;

use common::{cursor, engine_at, text};
use core_actions::Step;
use core_keymap::notation::ESC;
use core_keymap::{LocalKeymap, MainKeymap};

#[test]
fn dw_deletes_word_and_trailing_blank() {
    let mut e = engine_at(MainKeymap::ViCommand, "hello world", 0);
    assert_eq!(e.feed("d"), Step::Handled);
    assert_eq!(e.session().local, Some(LocalKeymap::ViOpp));
    e.feed("w");
    assert_eq!(text(&e), "world");
    assert_eq!(cursor(&e), 0);
    assert_eq!(e.session().registers.unnamed, "hello ");
    assert_eq!(e.session().local, None);
    assert!(e.session().operators.is_empty());
}

#[test]
fn repeated_operator_takes_whole_line() {
    let mut e = engine_at(MainKeymap::ViCommand, "some text", 3);
    e.feed_str("dd");
    assert_eq!(text(&e), "");
    assert_eq!(e.session().registers.unnamed, "some text");
}

#[test]
fn counts_before_operator_and_before_motion_multiply() {
    let mut e = engine_at(MainKeymap::ViCommand, "one two three four", 0);
    e.feed_str("2dw");
    assert_eq!(text(&e), "three four");

    let mut e = engine_at(MainKeymap::ViCommand, "one two three four", 0);
    e.feed_str("d2w");
    assert_eq!(text(&e), "three four");
}

#[test]
fn zero_continues_a_count() {
    let mut e = engine_at(MainKeymap::ViCommand, "abcdefghijklmnop", 0);
    e.feed_str("10l");
    assert_eq!(cursor(&e), 10);
    e.feed("0");
    assert_eq!(cursor(&e), 0);
}

#[test]
fn change_to_word_end_enters_insert() {
    let mut e = engine_at(MainKeymap::ViCommand, "foo bar", 0);
    e.feed_str("ce");
    assert_eq!(text(&e), " bar");
    assert_eq!(e.session().main, MainKeymap::ViInsert);
    e.feed_str("baz");
    assert_eq!(text(&e), "baz bar");
}

#[test]
fn uppercase_d_and_c_are_macros() {
    let mut e = engine_at(MainKeymap::ViCommand, "hello world", 6);
    e.feed("D");
    assert_eq!(text(&e), "hello ");
    assert_eq!(cursor(&e), 5);
    assert_eq!(e.pending(), "");

    let mut e = engine_at(MainKeymap::ViCommand, "hello world", 6);
    e.feed("C");
    assert_eq!(text(&e), "hello ");
    assert_eq!(cursor(&e), 6);
    assert_eq!(e.session().main, MainKeymap::ViInsert);
}

#[test]
fn non_motion_cancels_pending_operator() {
    let mut e = engine_at(MainKeymap::ViCommand, "hello", 0);
    e.feed_str("di");
    assert_eq!(text(&e), "hello");
    assert_eq!(e.session().local, None);
    assert_eq!(e.session().main, MainKeymap::ViCommand);
    assert!(e.session().operators.is_empty());
}

#[test]
fn escape_cancels_pending_operator() {
    let mut e = engine_at(MainKeymap::ViCommand, "hello", 0);
    e.feed("d");
    assert_eq!(e.feed(ESC), Step::Handled);
    assert_eq!(e.session().local, None);
    e.feed("w");
    assert_eq!(text(&e), "hello");
}

#[test]
fn yank_then_put() {
    let mut e = engine_at(MainKeymap::ViCommand, "ab", 0);
    e.feed_str("yl");
    assert_eq!(e.session().registers.unnamed, "a");
    assert_eq!(text(&e), "ab");
    e.feed("p");
    assert_eq!(text(&e), "aab");
    assert_eq!(cursor(&e), 1);
}

#[test]
fn counted_x_stops_at_row_end() {
    let mut e = engine_at(MainKeymap::ViCommand, "abcdef", 2);
    e.feed_str("3x");
    assert_eq!(text(&e), "abf");
    e.feed_str("9x");
    assert_eq!(text(&e), "ab");
    assert_eq!(cursor(&e), 1);
}

#[test]
fn oversized_counts_saturate() {
    let mut e = engine_at(MainKeymap::ViCommand, "one two three", 0);
    e.feed_str("9999999999d9999999999w");
    assert_eq!(text(&e), "");
    assert_eq!(e.session().local, None);

    let mut e = engine_at(MainKeymap::ViCommand, "abc", 1);
    e.feed_str("99999999999999999999999x");
    assert_eq!(text(&e), "a");
    assert_eq!(cursor(&e), 0);
}

#[test]
fn put_repeats_at_most_max_count_times() {
    let mut e = engine_at(MainKeymap::ViCommand, "ab", 0);
    e.feed_str("yl");
    e.feed_str("99999999999p");
    assert_eq!(text(&e).chars().count(), 2 + core_state::MAX_COUNT);
}

#[test]
fn visual_selection_deletes_inclusively() {
    let mut e = engine_at(MainKeymap::ViCommand, "hello world", 0);
    e.feed("v");
    assert_eq!(e.session().local, Some(LocalKeymap::Visual));
    e.feed("e");
    assert_eq!(cursor(&e), 4);
    e.feed("d");
    assert_eq!(text(&e), " world");
    assert_eq!(e.session().registers.unnamed, "hello");
    assert_eq!(e.session().local, None);
}

#[test]
fn visual_escape_leaves_text_alone() {
    let mut e = engine_at(MainKeymap::ViCommand, "hello", 0);
    e.feed_str("vl");
    e.feed(ESC);
    assert_eq!(e.session().local, None);
    assert_eq!(e.session().visual_anchor, None);
    assert_eq!(text(&e), "hello");
}

#[test]
fn insert_then_escape_round_trip() {
    let mut e = engine_at(MainKeymap::ViCommand, "", 0);
    e.feed("i");
    e.feed_str("abc");
    e.feed(ESC);
    assert_eq!(e.session().main, MainKeymap::ViCommand);
    assert_eq!(cursor(&e), 2);
    e.feed("A");
    e.feed_str("d");
    assert_eq!(text(&e), "abcd");
}
