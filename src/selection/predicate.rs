//! Selection predicates
//!
//! The three families of file predicate an archive command can carry.

use std::time::SystemTime;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

use crate::error::{Result, W24Error};
use crate::protocol::{
    validate_date, Command, NO_EXTENSION_MATCH, NO_FILE_FOUND, NO_MATCH_AFTER, NO_MATCH_BEFORE,
};
use crate::traversal::DirectoryEntry;

// =============================================================================
// Size Range
// =============================================================================

/// Open interval `(min, max)` over file sizes in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRange {
    min: u64,
    max: u64,
}

impl SizeRange {
    /// Rejects negative bounds and `min > max`
    pub fn new(min: i64, max: i64) -> Result<Self> {
        if min < 0 || max < 0 || min > max {
            return Err(W24Error::InvalidSelection(format!(
                "size range [{}, {}] is not valid",
                min, max
            )));
        }
        Ok(Self {
            min: min as u64,
            max: max as u64,
        })
    }

    /// Both ends exclusive
    pub fn contains(&self, size: u64) -> bool {
        size > self.min && size < self.max
    }
}

// =============================================================================
// Extension Set
// =============================================================================

/// One to three extensions, matched case-sensitively against `.<ext>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    suffixes: Vec<String>,
}

impl ExtensionSet {
    pub const MAX_EXTENSIONS: usize = 3;

    pub fn new<I, S>(extensions: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes: Vec<String> = extensions
            .into_iter()
            .map(|ext| format!(".{}", ext.as_ref()))
            .collect();

        if suffixes.is_empty() || suffixes.len() > Self::MAX_EXTENSIONS {
            return Err(W24Error::InvalidSelection(format!(
                "expected 1-{} extensions, got {}",
                Self::MAX_EXTENSIONS,
                suffixes.len()
            )));
        }
        if suffixes.iter().any(|s| s.len() == 1) {
            return Err(W24Error::InvalidSelection("empty extension".into()));
        }

        Ok(Self { suffixes })
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }
}

// =============================================================================
// Date Bound
// =============================================================================

/// A modification-time bound derived from a local calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    /// Not newer than the last instant of the day
    OnOrBefore(SystemTime),

    /// At or after the first instant of the day
    OnOrAfter(SystemTime),
}

impl DateBound {
    pub fn on_or_before(date: &str) -> Result<Self> {
        let day = parse_calendar_date(date)?;
        let end = day
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .ok_or_else(|| W24Error::InvalidSelection(format!("no end of day for {}", date)))?;
        Ok(DateBound::OnOrBefore(local_instant(end, true)))
    }

    pub fn on_or_after(date: &str) -> Result<Self> {
        let day = parse_calendar_date(date)?;
        let start = day
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| W24Error::InvalidSelection(format!("no start of day for {}", date)))?;
        Ok(DateBound::OnOrAfter(local_instant(start, false)))
    }

    pub fn admits(&self, modified: SystemTime) -> bool {
        match self {
            DateBound::OnOrBefore(end) => modified <= *end,
            DateBound::OnOrAfter(start) => modified >= *start,
        }
    }
}

fn parse_calendar_date(date: &str) -> Result<NaiveDate> {
    validate_date(date).map_err(|e| W24Error::InvalidSelection(e.to_string()))?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| W24Error::InvalidSelection(format!("{}: {}", date, e)))
}

/// Resolve a local wall-clock time. Ambiguous times (DST fold) resolve
/// outward so the bound stays inclusive; skipped times fall back to UTC.
fn local_instant(naive: NaiveDateTime, latest: bool) -> SystemTime {
    let resolved = Local.from_local_datetime(&naive);
    let instant: Option<DateTime<Local>> = if latest {
        resolved.latest()
    } else {
        resolved.earliest()
    };
    instant
        .map(SystemTime::from)
        .unwrap_or_else(|| SystemTime::from(naive.and_utc()))
}

// =============================================================================
// Selection
// =============================================================================

/// A predicate over regular files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Size(SizeRange),
    Extensions(ExtensionSet),
    Date(DateBound),
}

impl Selection {
    /// Build the selection an archive command asks for.
    ///
    /// Returns `None` for commands that do not select files.
    pub fn from_command(command: &Command) -> Option<Result<Self>> {
        let selection = match command {
            Command::SizeRange { min, max } => SizeRange::new(*min, *max).map(Selection::Size),
            Command::Extensions { extensions } => {
                ExtensionSet::new(extensions).map(Selection::Extensions)
            }
            Command::DateBefore { date } => DateBound::on_or_before(date).map(Selection::Date),
            Command::DateAfter { date } => DateBound::on_or_after(date).map(Selection::Date),
            _ => return None,
        };
        Some(selection)
    }

    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        match self {
            Selection::Size(range) => range.contains(entry.size),
            Selection::Extensions(set) => set.matches_name(&entry.name),
            Selection::Date(bound) => bound.admits(entry.modified),
        }
    }

    /// The literal reply when nothing matches
    pub fn no_match_message(&self) -> &'static str {
        match self {
            Selection::Size(_) => NO_FILE_FOUND,
            Selection::Extensions(_) => NO_EXTENSION_MATCH,
            Selection::Date(DateBound::OnOrBefore(_)) => NO_MATCH_BEFORE,
            Selection::Date(DateBound::OnOrAfter(_)) => NO_MATCH_AFTER,
        }
    }
}
