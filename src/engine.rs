//! Engine Module
//!
//! The session protocol engine: turns one command into the frames written
//! back on the session.
//!
//! ## Responsibilities
//! - Dispatch parsed commands to the listing, lookup and selection handlers
//! - Stream directory listings as they are discovered
//! - Build, stream and clean up one private artifact per archive request
//! - Turn filesystem and archive-tool failures into user-visible text
//!
//! Only failures writing to the session are returned as errors; they end
//! the session. Everything else becomes a reply.

use std::io::Write;
use std::path::Path;

use crate::archive::{ArchiveBuilder, ArtifactStore, TarGzBuilder};
use crate::config::Config;
use crate::error::{Result, W24Error};
use crate::protocol::{
    send_archive, write_end_marker, write_message, write_text_frame, Command, CommandType,
    DirOrder, ARCHIVE_FAILED, COMMAND_TOO_LONG, FILE_NOT_FOUND, INVALID_DATE, INVALID_SIZE_RANGE, NO_FILE_FOUND,
    SEARCH_FAILED,
};
use crate::selection::{Selection, Selector};
use crate::traversal::Walker;

/// What the session should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The protocol engine shared by every session of a server
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Walker for listings and lookups
    walker: Walker,

    /// Selection over the search root, artifact directory excluded
    selector: Selector,

    /// Archive construction capability
    builder: Box<dyn ArchiveBuilder>,

    /// Private artifact paths, one per archive request
    artifacts: ArtifactStore,
}

impl Engine {
    /// Open an engine that packages archives as tar.gz
    pub fn open(config: Config) -> Result<Self> {
        Self::with_builder(config, Box::new(TarGzBuilder::default()))
    }

    /// Open an engine with a custom archive builder
    pub fn with_builder(config: Config, builder: Box<dyn ArchiveBuilder>) -> Result<Self> {
        config.validate()?;

        let artifacts = ArtifactStore::open(&config.artifact_dir, config.keep_artifacts)?;
        let walker = Walker::new(config.max_depth);
        let selector = Selector::new(
            &config.base_dir,
            walker.clone().exclude(artifacts.dir()),
        );

        tracing::debug!(
            "Engine ready: root {}, artifacts in {}",
            config.base_dir.display(),
            artifacts.dir().display()
        );

        Ok(Self {
            config,
            walker,
            selector,
            builder,
            artifacts,
        })
    }

    /// Parse and execute one raw command line.
    ///
    /// Lines that do not parse are answered in the framing the client
    /// expects for that keyword.
    pub fn handle_line<W: Write>(&self, line: &str, session: u64, out: &mut W) -> Result<Flow> {
        match Command::parse(line) {
            Ok(command) => self.execute(command, session, out),
            Err(e) => {
                tracing::debug!("Session {}: rejected {:?}: {}", session, line.trim_end(), e);
                self.reject(line, &e, out)?;
                Ok(Flow::Continue)
            }
        }
    }

    /// Execute a command, writing its reply to `out`
    pub fn execute<W: Write>(&self, command: Command, session: u64, out: &mut W) -> Result<Flow> {
        tracing::trace!("Session {}: executing {:?}", session, command);

        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::DirList { order } => self.list_directories(order, out)?,
            Command::FindFile { name } => self.find_file(&name, out)?,
            ref selection_command => self.send_selection(selection_command, session, out)?,
        }

        Ok(Flow::Continue)
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    fn list_directories<W: Write>(&self, order: DirOrder, out: &mut W) -> Result<()> {
        let root = &self.config.base_dir;
        let mut write_error = None;

        let listed = self.walker.list_directories(root, order, |entry| {
            out.write_all(entry.listing_line(order).as_bytes())
                .map_err(|e| {
                    let message = e.to_string();
                    write_error = Some(e);
                    W24Error::Network(message)
                })
        });

        if let Some(e) = write_error {
            return Err(e.into());
        }
        match listed {
            Ok(count) => tracing::debug!("Listed {} directories ({})", count, order.flag()),
            Err(e) => tracing::warn!("Cannot list {}: {}", root.display(), e),
        }

        write_end_marker(out)
    }

    fn find_file<W: Write>(&self, name: &str, out: &mut W) -> Result<()> {
        let body = match self.walker.find_file(&self.config.base_dir, name) {
            Some(entry) => {
                tracing::debug!("Found {} at {}", name, entry.path.display());
                entry.info_record()
            }
            None => {
                tracing::debug!("No file named {}", name);
                FILE_NOT_FOUND.to_string()
            }
        };

        write_text_frame(out, body.as_bytes())
    }

    fn send_selection<W: Write>(&self, command: &Command, session: u64, out: &mut W) -> Result<()> {
        let selection = match Selection::from_command(command) {
            Some(Ok(selection)) => selection,
            Some(Err(e)) => {
                tracing::debug!("Session {}: {}", session, e);
                let message = match command.command_type() {
                    CommandType::SizeRange => INVALID_SIZE_RANGE,
                    CommandType::DateBefore | CommandType::DateAfter => INVALID_DATE,
                    _ => SEARCH_FAILED,
                };
                return write_message(out, message);
            }
            None => {
                return Err(W24Error::Protocol(format!(
                    "{} does not select files",
                    command.command_type().keyword()
                )))
            }
        };

        // Cheap test first: nothing matching means the builder never runs
        match self.selector.any_match(&selection) {
            Ok(true) => {}
            Ok(false) => return write_message(out, selection.no_match_message()),
            Err(e) => {
                tracing::warn!("Selection walk failed: {}", e);
                return write_message(out, SEARCH_FAILED);
            }
        }

        let files = match self.selector.collect(&selection) {
            Ok(files) if !files.is_empty() => files,
            Ok(_) => return write_message(out, selection.no_match_message()),
            Err(e) => {
                tracing::warn!("Selection walk failed: {}", e);
                return write_message(out, SEARCH_FAILED);
            }
        };

        let mut artifact = self.artifacts.allocate(session);
        match self.builder.build(self.selector.root(), &files, artifact.path()) {
            Ok(len) => artifact.set_len(len),
            Err(e) => {
                tracing::warn!("Session {}: archive build failed: {}", session, e);
                return write_message(out, ARCHIVE_FAILED);
            }
        }

        if artifact.len() <= self.config.min_archive_len {
            tracing::debug!(
                "Artifact {} is near-empty ({} bytes), not sending",
                artifact.path().display(),
                artifact.len()
            );
            return write_message(out, NO_FILE_FOUND);
        }

        let mut source = match artifact.open() {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("Cannot reopen {}: {}", artifact.path().display(), e);
                return write_message(out, ARCHIVE_FAILED);
            }
        };

        let sent = send_archive(out, &mut source, artifact.len(), self.config.chunk_size)?;
        tracing::info!(
            "Session {}: sent {} files as {} ({} bytes)",
            session,
            files.len(),
            artifact.path().display(),
            sent
        );
        Ok(())
    }

    /// Answer a line cut off at the length limit. `head` is the part that
    /// was read; its keyword picks the framing.
    pub fn reject_oversized<W: Write>(&self, head: &str, out: &mut W) -> Result<()> {
        match head.split_whitespace().next().and_then(CommandType::from_token) {
            Some(t) if t.produces_archive() => write_message(out, COMMAND_TOO_LONG),
            _ => write_text_frame(out, COMMAND_TOO_LONG.as_bytes()),
        }
    }

    /// Answer a line that failed to parse
    fn reject<W: Write>(&self, line: &str, error: &W24Error, out: &mut W) -> Result<()> {
        let command_type = line.split_whitespace().next().and_then(CommandType::from_token);

        match command_type {
            Some(CommandType::SizeRange) => write_message(out, INVALID_SIZE_RANGE),
            Some(t) if t.produces_archive() => write_message(out, &format!("{}\n", error)),
            _ => write_text_frame(out, format!("{}\n", error).as_bytes()),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the search root
    pub fn base_dir(&self) -> &Path {
        &self.config.base_dir
    }

    /// Get the artifact directory
    pub fn artifact_dir(&self) -> &Path {
        self.artifacts.dir()
    }
}
