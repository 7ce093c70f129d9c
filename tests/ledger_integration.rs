//! Integration tests for the ledger.
//!
//! These tests exercise the ledger against real files created with
//! tempfile, asserting on the byte-level file contents where the
//! preservation guarantees matter.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use depot::core::ledger::{Ledger, LedgerError, Record};

// =============================================================================
// Test Helpers
// =============================================================================

fn empty_ledger() -> (TempDir, Ledger, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join(".depot");
    fs::write(&path, "").expect("create ledger file");
    (dir, Ledger::new(path.clone()), path)
}

// =============================================================================
// Store / Find / Remove
// =============================================================================

#[test]
fn store_then_find_returns_the_pair_from_both_sides() {
    let (_dir, ledger, _path) = empty_ledger();

    ledger.store("a", "b").expect("store");

    let expected = Record::new("a", "b");
    assert_eq!(ledger.find("a").expect("find by target"), expected);
    assert_eq!(ledger.find("b").expect("find by symlink"), expected);
}

#[test]
fn remove_returns_the_file_to_empty() {
    let (_dir, ledger, path) = empty_ledger();

    ledger.store("a", "b").expect("store");
    ledger.remove("b").expect("remove");

    assert_eq!(fs::read_to_string(&path).expect("read"), "");
}

#[test]
fn remove_without_a_match_fails_and_leaves_the_file_alone() {
    let (_dir, ledger, path) = empty_ledger();
    ledger.store("a", "b").expect("store");
    let before = fs::read_to_string(&path).expect("read");

    let err = ledger.remove("x").expect_err("no such symlink");
    assert!(matches!(err, LedgerError::NotFound(_)));
    assert_eq!(fs::read_to_string(&path).expect("read"), before);
}

#[test]
fn remove_drops_exactly_one_entry_and_preserves_everything_else() {
    let (_dir, ledger, path) = empty_ledger();

    fs::write(
        &path,
        "# dotfiles tracked on laptop\n\
         \n\
         \"vimrc\" => \"/home/me/.vimrc\"\n\
         # editors below\n\
         \"emacs\" => \"/home/me/.emacs\"\n",
    )
    .expect("seed ledger");

    ledger.remove("vimrc").expect("remove");

    assert_eq!(
        fs::read_to_string(&path).expect("read"),
        "# dotfiles tracked on laptop\n\
         \n\
         # editors below\n\
         \"emacs\" => \"/home/me/.emacs\"\n"
    );
}

#[test]
fn duplicate_store_is_rejected_on_either_field() {
    let (_dir, ledger, _path) = empty_ledger();
    ledger.store("/home/me/.vimrc", "vimrc").expect("store");

    for (target, symlink) in [
        ("/home/me/.vimrc", "other"),
        ("/other", "vimrc"),
        ("vimrc", "fresh"),
        ("/fresh", "/home/me/.vimrc"),
    ] {
        let err = ledger.store(target, symlink).expect_err("duplicate");
        assert!(matches!(err, LedgerError::Duplicate(_)));
    }
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn a_line_with_three_fields_aborts_the_read_with_its_line_number() {
    let (_dir, ledger, path) = empty_ledger();
    fs::write(
        &path,
        "\"good\" => \"/fine\"\n\"a\" => \"b\" => \"c\"\n",
    )
    .expect("seed ledger");

    match ledger.read() {
        Err(LedgerError::Parse { line }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {:?}", other),
    }
    // No partial results either.
    assert!(ledger.records().is_err());
}

#[test]
fn hostile_path_content_round_trips_exactly() {
    let (_dir, ledger, _path) = empty_ledger();

    let target = "/home/me/di\"r => with\\everything\t(tab)";
    let symlink = "store/emb => edded \"quotes\"";
    ledger.store(target, symlink).expect("store");

    let record = ledger.find(target).expect("find");
    assert_eq!(record.target, target);
    assert_eq!(record.symlink, symlink);

    // And survives a rewrite cycle.
    ledger.store("/plain", "plain").expect("store second");
    ledger.remove("plain").expect("remove second");
    let record = ledger.find(symlink).expect("find after rewrite");
    assert_eq!(record.target, target);
    assert_eq!(record.symlink, symlink);
}

#[test]
fn comments_survive_append_and_rewrite_cycles() {
    let (_dir, ledger, path) = empty_ledger();
    fs::write(&path, "# header\n\n# another\n").expect("seed ledger");

    ledger.store("/t1", "s1").expect("store 1");
    ledger.store("/t2", "s2").expect("store 2");
    ledger.remove("s1").expect("remove 1");

    assert_eq!(
        fs::read_to_string(&path).expect("read"),
        "# header\n\n# another\n\"s2\" => \"/t2\"\n"
    );
}
