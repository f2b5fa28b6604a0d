//! Traversal Module
//!
//! Recursive directory enumeration for listings and name lookup.
//!
//! ## Responsibilities
//! - Enumerate directories depth-first, parent before children
//! - Order siblings case-insensitively by name (`-a`) or by creation time (`-t`)
//! - Locate a file by exact name
//! - Feed regular files to the selection engine
//!
//! Hidden entries (leading `.`) are excluded from everything.

mod entry;
mod walker;

pub use entry::{
    escape_line_breaks, is_hidden_name, read_entries, sort_entries, DirectoryEntry, EntryKind,
    HIDDEN_MARKER,
};
pub use walker::Walker;
