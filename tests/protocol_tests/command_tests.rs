//! Tests for command parsing
//!
//! These tests verify:
//! - Each keyword parses into its command
//! - Arity is enforced with the user-facing messages
//! - Date operands are checked for shape only
//! - Unknown and empty lines are rejected

use w24fs::protocol::{is_valid_date, Command, CommandType, DirOrder};
use w24fs::W24Error;

fn validation_message(line: &str) -> String {
    match Command::parse(line) {
        Err(W24Error::Validation(message)) => message,
        other => panic!("expected validation error for {:?}, got {:?}", line, other),
    }
}

// =============================================================================
// Parsing Tests
// =============================================================================

#[test]
fn test_parse_dirlist_orders() {
    assert_eq!(
        Command::parse("dirlist -a").unwrap(),
        Command::DirList {
            order: DirOrder::Alphabetical
        }
    );
    assert_eq!(
        Command::parse("dirlist -t").unwrap(),
        Command::DirList {
            order: DirOrder::Created
        }
    );
}

#[test]
fn test_parse_dirlist_bad_option() {
    let message = validation_message("dirlist -x");
    assert!(message.contains("-x"));
}

#[test]
fn test_parse_find_file() {
    assert_eq!(
        Command::parse("w24fn notes.txt").unwrap(),
        Command::FindFile {
            name: "notes.txt".to_string()
        }
    );
}

#[test]
fn test_parse_size_range_keeps_signed_bounds() {
    // Range validity is the server's call, the parser only wants integers
    assert_eq!(
        Command::parse("w24fz -5 100").unwrap(),
        Command::SizeRange { min: -5, max: 100 }
    );
    assert_eq!(
        Command::parse("w24fz 200 100").unwrap(),
        Command::SizeRange { min: 200, max: 100 }
    );
}

#[test]
fn test_parse_size_range_non_integer() {
    assert!(matches!(
        Command::parse("w24fz ten 100"),
        Err(W24Error::Validation(_))
    ));
}

#[test]
fn test_parse_extensions_one_to_three() {
    assert_eq!(
        Command::parse("w24ft c").unwrap(),
        Command::Extensions {
            extensions: vec!["c".to_string()]
        }
    );
    assert_eq!(
        Command::parse("w24ft c h txt").unwrap(),
        Command::Extensions {
            extensions: vec!["c".to_string(), "h".to_string(), "txt".to_string()]
        }
    );
}

#[test]
fn test_parse_dates() {
    assert_eq!(
        Command::parse("w24fdb 2024-01-31").unwrap(),
        Command::DateBefore {
            date: "2024-01-31".to_string()
        }
    );
    assert_eq!(
        Command::parse("w24fda 2024-01-31").unwrap(),
        Command::DateAfter {
            date: "2024-01-31".to_string()
        }
    );
}

#[test]
fn test_parse_quit() {
    assert_eq!(Command::parse("quitc").unwrap(), Command::Quit);
    assert_eq!(Command::parse("  quitc  \r\n").unwrap(), Command::Quit);
}

#[test]
fn test_parse_collapses_whitespace() {
    assert_eq!(
        Command::parse("w24fz   10 \t 20\n").unwrap(),
        Command::SizeRange { min: 10, max: 20 }
    );
}

// =============================================================================
// Arity Tests
// =============================================================================

#[test]
fn test_arity_messages() {
    assert_eq!(
        validation_message("w24fn"),
        "Command requires exactly one argument."
    );
    assert_eq!(
        validation_message("w24fn a b"),
        "Command requires exactly one argument."
    );
    assert_eq!(
        validation_message("w24fz 10"),
        "Command requires exactly two arguments."
    );
    assert_eq!(
        validation_message("w24ft"),
        "Command should have 1-3 arguments."
    );
    assert_eq!(
        validation_message("w24ft a b c d"),
        "Command should have 1-3 arguments."
    );
    assert_eq!(validation_message("quitc now"), "Command takes no arguments.");
    assert_eq!(
        validation_message("w24fdb"),
        "Command requires exactly one argument."
    );
}

#[test]
fn test_unknown_and_empty() {
    assert_eq!(validation_message("ls -la"), "Unknown command: ls");
    assert_eq!(validation_message("   "), "Empty command.");
}

#[test]
fn test_keywords_are_case_sensitive() {
    assert_eq!(validation_message("DIRLIST -a"), "Unknown command: DIRLIST");
}

// =============================================================================
// Date Shape Tests
// =============================================================================

#[test]
fn test_date_shape() {
    assert!(is_valid_date("2024-03-15"));
    assert!(is_valid_date("0000-00-00"));

    // Shape only; calendar checks happen on the server
    assert!(is_valid_date("2024-13-45"));

    assert!(!is_valid_date("2024-3-15"));
    assert!(!is_valid_date("2024/03/15"));
    assert!(!is_valid_date("2024-03-1a"));
    assert!(!is_valid_date("2024-03-155"));
    assert!(!is_valid_date(""));
}

#[test]
fn test_bad_date_rejected_before_sending() {
    let message = validation_message("w24fda 15-03-2024");
    assert!(message.starts_with("Date format is incorrect"));

    let message = validation_message("w24fdb 2024-3-1");
    assert!(message.starts_with("Date length is incorrect"));
}

// =============================================================================
// Command Type Tests
// =============================================================================

#[test]
fn test_command_type_lookup() {
    assert_eq!(CommandType::from_token("w24fz"), Some(CommandType::SizeRange));
    assert_eq!(CommandType::from_token("w24fz "), None);
    assert_eq!(CommandType::SizeRange.keyword(), "w24fz");
}

#[test]
fn test_produces_archive() {
    assert!(CommandType::SizeRange.produces_archive());
    assert!(CommandType::Extensions.produces_archive());
    assert!(CommandType::DateBefore.produces_archive());
    assert!(CommandType::DateAfter.produces_archive());
    assert!(!CommandType::DirList.produces_archive());
    assert!(!CommandType::FindFile.produces_archive());
    assert!(!CommandType::Quit.produces_archive());
}

#[test]
fn test_to_line_is_newline_terminated() {
    let cmd = Command::parse("w24fz 1 2").unwrap();
    assert_eq!(cmd.to_line(), "w24fz 1 2\n");
    assert_eq!(Command::Quit.to_line(), "quitc\n");
}
