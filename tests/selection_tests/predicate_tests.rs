//! Tests for selection predicates

use std::time::SystemTime;

use chrono::{Local, TimeZone};
use w24fs::protocol::{
    Command, DirOrder, NO_EXTENSION_MATCH, NO_FILE_FOUND, NO_MATCH_AFTER, NO_MATCH_BEFORE,
};
use w24fs::selection::{DateBound, ExtensionSet, Selection, SizeRange};
use w24fs::W24Error;

fn local(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> SystemTime {
    Local
        .with_ymd_and_hms(y, m, d, hh, mm, ss)
        .earliest()
        .unwrap()
        .into()
}

// =============================================================================
// Size Range Tests
// =============================================================================

#[test]
fn test_size_range_is_open_interval() {
    let range = SizeRange::new(0, 100).unwrap();

    assert!(range.contains(50));
    assert!(range.contains(1));
    assert!(range.contains(99));
    assert!(!range.contains(0));
    assert!(!range.contains(100));
    assert!(!range.contains(150));
}

#[test]
fn test_size_range_equal_bounds_selects_nothing() {
    let range = SizeRange::new(10, 10).unwrap();
    assert!(!range.contains(10));
}

#[test]
fn test_size_range_rejects_bad_bounds() {
    assert!(matches!(
        SizeRange::new(-1, 10),
        Err(W24Error::InvalidSelection(_))
    ));
    assert!(matches!(
        SizeRange::new(0, -10),
        Err(W24Error::InvalidSelection(_))
    ));
    assert!(matches!(
        SizeRange::new(100, 50),
        Err(W24Error::InvalidSelection(_))
    ));
}

// =============================================================================
// Extension Set Tests
// =============================================================================

#[test]
fn test_extension_matching_is_case_sensitive() {
    let set = ExtensionSet::new(["txt"]).unwrap();

    assert!(set.matches_name("notes.txt"));
    assert!(set.matches_name("archive.tar.txt"));
    assert!(!set.matches_name("NOTES.TXT"));
    assert!(!set.matches_name("notestxt"));
    assert!(!set.matches_name("txt"));
}

#[test]
fn test_extension_any_of() {
    let set = ExtensionSet::new(["c", "h", "rs"]).unwrap();

    assert!(set.matches_name("main.c"));
    assert!(set.matches_name("main.h"));
    assert!(set.matches_name("lib.rs"));
    assert!(!set.matches_name("main.cpp"));
}

#[test]
fn test_extension_count_limits() {
    let empty: [&str; 0] = [];
    assert!(ExtensionSet::new(empty).is_err());
    assert!(ExtensionSet::new(["a", "b", "c", "d"]).is_err());
    assert!(ExtensionSet::new([""]).is_err());
}

// =============================================================================
// Date Bound Tests
// =============================================================================

#[test]
fn test_on_or_before_includes_whole_day() {
    let bound = DateBound::on_or_before("2024-01-15").unwrap();

    assert!(bound.admits(local(2024, 1, 15, 0, 0, 0)));
    assert!(bound.admits(local(2024, 1, 15, 23, 59, 59)));
    assert!(bound.admits(local(2023, 6, 1, 12, 0, 0)));
    assert!(!bound.admits(local(2024, 1, 16, 0, 0, 1)));
}

#[test]
fn test_on_or_after_includes_whole_day() {
    let bound = DateBound::on_or_after("2024-01-15").unwrap();

    assert!(bound.admits(local(2024, 1, 15, 0, 0, 0)));
    assert!(bound.admits(local(2024, 1, 15, 18, 30, 0)));
    assert!(bound.admits(local(2025, 1, 1, 0, 0, 0)));
    assert!(!bound.admits(local(2024, 1, 14, 23, 59, 59)));
}

#[test]
fn test_date_bound_rejects_impossible_dates() {
    assert!(matches!(
        DateBound::on_or_before("2024-02-30"),
        Err(W24Error::InvalidSelection(_))
    ));
    assert!(matches!(
        DateBound::on_or_after("2024-13-01"),
        Err(W24Error::InvalidSelection(_))
    ));
    assert!(DateBound::on_or_after("2024-02-29").is_ok());
}

// =============================================================================
// Selection Tests
// =============================================================================

#[test]
fn test_selection_from_command() {
    let size = Selection::from_command(&Command::SizeRange { min: 1, max: 9 });
    assert!(matches!(size, Some(Ok(Selection::Size(_)))));

    let bad = Selection::from_command(&Command::SizeRange { min: 9, max: 1 });
    assert!(matches!(bad, Some(Err(W24Error::InvalidSelection(_)))));

    let listing = Selection::from_command(&Command::DirList {
        order: DirOrder::Alphabetical,
    });
    assert!(listing.is_none());
    assert!(Selection::from_command(&Command::Quit).is_none());
}

#[test]
fn test_no_match_messages() {
    let size = Selection::Size(SizeRange::new(0, 1).unwrap());
    let ext = Selection::Extensions(ExtensionSet::new(["x"]).unwrap());
    let before = Selection::Date(DateBound::on_or_before("2024-01-01").unwrap());
    let after = Selection::Date(DateBound::on_or_after("2024-01-01").unwrap());

    assert_eq!(size.no_match_message(), NO_FILE_FOUND);
    assert_eq!(ext.no_match_message(), NO_EXTENSION_MATCH);
    assert_eq!(before.no_match_message(), NO_MATCH_BEFORE);
    assert_eq!(after.no_match_message(), NO_MATCH_AFTER);
}
