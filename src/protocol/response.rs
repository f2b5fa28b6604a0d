//! Response definitions
//!
//! Literal texts the server answers with, and the two frame shapes a
//! response can take on the wire.

/// Terminator appended to every text frame
pub const END_MARKER: &[u8] = b"\nEND_OF_RESPONSE\n";

/// File lookup found nothing
pub const FILE_NOT_FOUND: &str = "File not found\n";

/// Command line exceeded the server's length limit
pub const COMMAND_TOO_LONG: &str = "Command too long\n";

/// Size bounds were negative or inverted
pub const INVALID_SIZE_RANGE: &str = "Invalid size range provided.\n";

/// Date operand is well-shaped but not a calendar day
pub const INVALID_DATE: &str = "Invalid date provided.\n";

/// Archive came out near-empty, or a size search found nothing
pub const NO_FILE_FOUND: &str = "No file found";

pub const NO_EXTENSION_MATCH: &str = "No files found matching the specified extensions.";
pub const NO_MATCH_BEFORE: &str = "No files found created on or before the specified date.";
pub const NO_MATCH_AFTER: &str = "No files found created on or after the specified date.";

/// The archive builder failed
pub const ARCHIVE_FAILED: &str = "Failed to create tar file.\n";

/// The selection walk could not start
pub const SEARCH_FAILED: &str = "Failed to search for files.\n";

/// Frame shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Length field followed by exactly that many payload bytes
    Binary { len: u64 },

    /// Printable text with no length or terminator
    Text,
}
