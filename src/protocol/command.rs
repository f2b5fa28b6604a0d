//! Command definitions
//!
//! Parses and validates the text command lines exchanged by client and server.
//! The same parser runs on both sides: the client uses it to reject malformed
//! input before anything is sent, the server to dispatch.

use crate::error::{Result, W24Error};

/// Command types, keyed by the first token of a command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    DirList,
    FindFile,
    SizeRange,
    Extensions,
    DateBefore,
    DateAfter,
    Quit,
}

impl CommandType {
    /// Look up the operation selected by a first token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "dirlist" => Some(CommandType::DirList),
            "w24fn" => Some(CommandType::FindFile),
            "w24fz" => Some(CommandType::SizeRange),
            "w24ft" => Some(CommandType::Extensions),
            "w24fdb" => Some(CommandType::DateBefore),
            "w24fda" => Some(CommandType::DateAfter),
            "quitc" => Some(CommandType::Quit),
            _ => None,
        }
    }

    /// The wire keyword for this command
    pub fn keyword(&self) -> &'static str {
        match self {
            CommandType::DirList => "dirlist",
            CommandType::FindFile => "w24fn",
            CommandType::SizeRange => "w24fz",
            CommandType::Extensions => "w24ft",
            CommandType::DateBefore => "w24fdb",
            CommandType::DateAfter => "w24fda",
            CommandType::Quit => "quitc",
        }
    }

    /// Accepted token counts, keyword included
    pub fn arity(&self) -> (usize, usize) {
        match self {
            CommandType::DirList => (2, 2),
            CommandType::FindFile => (2, 2),
            CommandType::SizeRange => (3, 3),
            CommandType::Extensions => (2, 4),
            CommandType::DateBefore | CommandType::DateAfter => (2, 2),
            CommandType::Quit => (1, 1),
        }
    }

    /// True for the commands answered with an archive or a bare message
    pub fn produces_archive(&self) -> bool {
        matches!(
            self,
            CommandType::SizeRange
                | CommandType::Extensions
                | CommandType::DateBefore
                | CommandType::DateAfter
        )
    }
}

/// Ordering of a directory listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirOrder {
    /// `-a`: case-insensitive by name
    Alphabetical,
    /// `-t`: oldest creation time first
    Created,
}

impl DirOrder {
    pub fn flag(&self) -> &'static str {
        match self {
            DirOrder::Alphabetical => "-a",
            DirOrder::Created => "-t",
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every directory under the search root
    DirList { order: DirOrder },

    /// Look up a file by exact name
    FindFile { name: String },

    /// Archive files with `min < size < max`
    SizeRange { min: i64, max: i64 },

    /// Archive files ending in `.<ext>` for any listed extension
    Extensions { extensions: Vec<String> },

    /// Archive files modified on or before the given `YYYY-MM-DD`
    DateBefore { date: String },

    /// Archive files modified on or after the given `YYYY-MM-DD`
    DateAfter { date: String },

    /// End the session
    Quit,
}

impl Command {
    /// Parse a command line.
    ///
    /// Arity and date shape are checked here, so a line that parses is
    /// safe to transmit. Range and calendar checks are left to the server.
    pub fn parse(line: &str) -> Result<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let keyword = tokens
            .first()
            .ok_or_else(|| W24Error::Validation("Empty command.".into()))?;

        let command_type = CommandType::from_token(keyword)
            .ok_or_else(|| W24Error::Validation(format!("Unknown command: {}", keyword)))?;

        check_arity(command_type, tokens.len())?;

        match command_type {
            CommandType::DirList => match tokens[1] {
                "-a" => Ok(Command::DirList {
                    order: DirOrder::Alphabetical,
                }),
                "-t" => Ok(Command::DirList {
                    order: DirOrder::Created,
                }),
                other => Err(W24Error::Validation(format!(
                    "Unknown dirlist option: {} (expected -a or -t)",
                    other
                ))),
            },
            CommandType::FindFile => Ok(Command::FindFile {
                name: tokens[1].to_string(),
            }),
            CommandType::SizeRange => {
                let min = parse_size(tokens[1])?;
                let max = parse_size(tokens[2])?;
                Ok(Command::SizeRange { min, max })
            }
            CommandType::Extensions => Ok(Command::Extensions {
                extensions: tokens[1..].iter().map(|t| t.to_string()).collect(),
            }),
            CommandType::DateBefore | CommandType::DateAfter => {
                let date = tokens[1];
                validate_date(date)?;
                if command_type == CommandType::DateBefore {
                    Ok(Command::DateBefore {
                        date: date.to_string(),
                    })
                } else {
                    Ok(Command::DateAfter {
                        date: date.to_string(),
                    })
                }
            }
            CommandType::Quit => Ok(Command::Quit),
        }
    }

    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::DirList { .. } => CommandType::DirList,
            Command::FindFile { .. } => CommandType::FindFile,
            Command::SizeRange { .. } => CommandType::SizeRange,
            Command::Extensions { .. } => CommandType::Extensions,
            Command::DateBefore { .. } => CommandType::DateBefore,
            Command::DateAfter { .. } => CommandType::DateAfter,
            Command::Quit => CommandType::Quit,
        }
    }

    /// Render the command as a wire line, `\n` included
    pub fn to_line(&self) -> String {
        let keyword = self.command_type().keyword();
        match self {
            Command::DirList { order } => format!("{} {}\n", keyword, order.flag()),
            Command::FindFile { name } => format!("{} {}\n", keyword, name),
            Command::SizeRange { min, max } => format!("{} {} {}\n", keyword, min, max),
            Command::Extensions { extensions } => {
                format!("{} {}\n", keyword, extensions.join(" "))
            }
            Command::DateBefore { date } | Command::DateAfter { date } => {
                format!("{} {}\n", keyword, date)
            }
            Command::Quit => format!("{}\n", keyword),
        }
    }
}

fn check_arity(command_type: CommandType, count: usize) -> Result<()> {
    let (min, max) = command_type.arity();
    if (min..=max).contains(&count) {
        return Ok(());
    }

    let message = match command_type {
        CommandType::Extensions => "Command should have 1-3 arguments.".to_string(),
        CommandType::SizeRange => "Command requires exactly two arguments.".to_string(),
        CommandType::Quit => "Command takes no arguments.".to_string(),
        _ => "Command requires exactly one argument.".to_string(),
    };
    Err(W24Error::Validation(message))
}

fn parse_size(token: &str) -> Result<i64> {
    token
        .parse::<i64>()
        .map_err(|_| W24Error::Validation(format!("Size bound is not an integer: {}", token)))
}

/// True iff `date` has the exact shape `DDDD-DD-DD`
pub fn is_valid_date(date: &str) -> bool {
    validate_date(date).is_ok()
}

/// Check the `YYYY-MM-DD` shape: ten bytes, dashes at 4 and 7, digits
/// everywhere else. The calendar is not consulted.
pub fn validate_date(date: &str) -> Result<()> {
    let bytes = date.as_bytes();
    if bytes.len() != 10 {
        return Err(W24Error::Validation(format!(
            "Date length is incorrect. Found length: {}, expected: 10.",
            bytes.len()
        )));
    }

    for (i, b) in bytes.iter().enumerate() {
        if i == 4 || i == 7 {
            if *b != b'-' {
                return Err(W24Error::Validation(
                    "Date format is incorrect. Expected '-' at positions 5 and 8.".into(),
                ));
            }
        } else if !b.is_ascii_digit() {
            return Err(W24Error::Validation(
                "Date format is incorrect. Non-digit characters found.".into(),
            ));
        }
    }

    Ok(())
}
