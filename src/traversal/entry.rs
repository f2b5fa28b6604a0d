//! Directory entries
//!
//! A snapshot of one name in a directory plus the metadata the protocol
//! reports.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};

use crate::protocol::DirOrder;

/// Leading byte that marks a name as hidden
pub const HIDDEN_MARKER: char = '.';

/// Entry type, as reported by the directory itself (symlinks not followed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

/// A single directory entry with its metadata
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    /// File name (lossy UTF-8)
    pub name: String,

    /// Full path (parent path joined with `name`)
    pub path: PathBuf,

    pub kind: EntryKind,

    /// Inode change time on Unix, birth time elsewhere
    pub created: SystemTime,

    pub modified: SystemTime,

    /// Size in bytes
    pub size: u64,

    /// Owner/group/other permission bits
    pub mode: u32,
}

impl DirectoryEntry {
    /// Stat a path without following a trailing symlink
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::symlink_metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self::from_metadata(name, path.to_path_buf(), &metadata))
    }

    fn from_metadata(name: String, path: PathBuf, metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };

        Self {
            name,
            path,
            kind,
            created: creation_time(metadata),
            modified: metadata.modified().unwrap_or(UNIX_EPOCH),
            size: metadata.len(),
            mode: permission_bits(metadata),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with(HIDDEN_MARKER)
    }

    /// The metadata record returned for a file lookup
    pub fn info_record(&self) -> String {
        let created: DateTime<Local> = self.created.into();
        format!(
            "Filename: {}\nSize: {} bytes\nCreated: {}\nPermissions: {:o}\n",
            escape_line_breaks(&self.name),
            self.size,
            created.format("%a %b %e %H:%M:%S %Y"),
            self.mode
        )
    }

    /// One line of a directory listing, `\n` included
    pub fn listing_line(&self, order: DirOrder) -> String {
        let path = self.path.to_string_lossy();
        let path = escape_line_breaks(&path);
        match order {
            DirOrder::Alphabetical => format!("{}\n", path),
            DirOrder::Created => {
                let created: DateTime<Local> = self.created.into();
                format!(
                    "{} - Created: {}\n",
                    path,
                    created.format("%Y-%m-%d %H:%M:%S")
                )
            }
        }
    }
}

/// Replace raw `\n` and `\r` with their two-character escapes.
///
/// A reply line must never contain a line break of its own, or a name like
/// `a\nEND_OF_RESPONSE` would close the text frame early.
pub fn escape_line_breaks(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace('\n', "\\n").replace('\r', "\\r"))
}

/// True for names starting with the hidden marker
pub fn is_hidden_name(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with(HIDDEN_MARKER)
}

/// Read one directory, skipping hidden names.
///
/// Entries whose metadata cannot be read are logged and skipped; only a
/// failure to open `dir` itself is returned.
pub fn read_entries(dir: &Path) -> io::Result<Vec<DirectoryEntry>> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        let name = entry.file_name();
        if is_hidden_name(&name) {
            continue;
        }

        match entry.metadata() {
            Ok(metadata) => entries.push(DirectoryEntry::from_metadata(
                name.to_string_lossy().into_owned(),
                entry.path(),
                &metadata,
            )),
            Err(e) => {
                tracing::debug!("Skipping {}: {}", entry.path().display(), e);
            }
        }
    }

    Ok(entries)
}

/// Sort siblings into a listing order. Ties fall back to the exact name so
/// the result is a total order.
pub fn sort_entries(entries: &mut [DirectoryEntry], order: DirOrder) {
    match order {
        DirOrder::Alphabetical => entries.sort_by(|a, b| {
            a.name
                .to_ascii_lowercase()
                .cmp(&b.name.to_ascii_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        }),
        DirOrder::Created => {
            entries.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.name.cmp(&b.name)))
        }
    }
}

#[cfg(unix)]
fn creation_time(metadata: &Metadata) -> SystemTime {
    use std::os::unix::fs::MetadataExt;

    let secs = metadata.ctime();
    let nanos = metadata.ctime_nsec().clamp(0, 999_999_999) as u32;
    if secs >= 0 {
        UNIX_EPOCH + Duration::new(secs as u64, nanos)
    } else {
        UNIX_EPOCH - Duration::from_secs(secs.unsigned_abs())
    }
}

#[cfg(not(unix))]
fn creation_time(metadata: &Metadata) -> SystemTime {
    metadata
        .created()
        .or_else(|_| metadata.modified())
        .unwrap_or(UNIX_EPOCH)
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o666
    }
}
