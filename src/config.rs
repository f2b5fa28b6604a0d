//! Configuration for the w24fs server
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Result, W24Error};

/// Name of the artifact directory created under the search root
pub const ARTIFACT_DIR_NAME: &str = "w24project";

/// Main configuration for a w24fs server instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Filesystem Configuration
    // -------------------------------------------------------------------------
    /// Root of every traversal and selection (the user's home by default)
    pub base_dir: PathBuf,

    /// Directory holding per-request archive artifacts.
    /// Always excluded from selections.
    pub artifact_dir: PathBuf,

    /// Deepest directory level the walker descends into (root = 0)
    pub max_depth: usize,

    // -------------------------------------------------------------------------
    // Archive Configuration
    // -------------------------------------------------------------------------
    /// Artifacts this size or smaller are treated as "no file found"
    pub min_archive_len: u64,

    /// Keep artifacts on disk after they have been streamed
    pub keep_artifacts: bool,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client sessions
    pub max_connections: usize,

    /// Upper bound on bytes moved per read/write during a transfer
    pub chunk_size: usize,

    /// Longest accepted command line, terminator included
    pub max_command_len: usize,

    /// Connection read timeout (milliseconds, 0 = platform default)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = platform default)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Coordinator Hand-off
    // -------------------------------------------------------------------------
    /// Write a port line on every accepted connection
    pub handshake: bool,

    /// Mirror ports that share the rotation with this server's own port
    pub redirect_ports: Vec<u16>,
}

impl Default for Config {
    fn default() -> Self {
        let base_dir = home_dir();
        Self {
            artifact_dir: base_dir.join(ARTIFACT_DIR_NAME),
            base_dir,
            max_depth: 256,
            min_archive_len: 1,
            keep_artifacts: false,
            listen_addr: "127.0.0.1:8086".to_string(),
            max_connections: 15,
            chunk_size: 1024,
            max_command_len: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            handshake: false,
            redirect_ports: Vec::new(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(W24Error::Config("chunk_size must be greater than 0".into()));
        }
        if self.max_connections == 0 {
            return Err(W24Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }
        if self.max_command_len == 0 {
            return Err(W24Error::Config(
                "max_command_len must be greater than 0".into(),
            ));
        }
        if self.base_dir.as_os_str().is_empty() {
            return Err(W24Error::Config("base_dir cannot be empty".into()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    artifact_dir_set: bool,
}

impl ConfigBuilder {
    /// Set the search root. Also moves the artifact directory underneath
    /// it unless one was set explicitly.
    pub fn base_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.base_dir = path.into();
        if !self.artifact_dir_set {
            self.config.artifact_dir = self.config.base_dir.join(ARTIFACT_DIR_NAME);
        }
        self
    }

    /// Set the artifact directory
    pub fn artifact_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.artifact_dir = path.into();
        self.artifact_dir_set = true;
        self
    }

    /// Set the maximum walk depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Set the near-empty archive threshold (in bytes)
    pub fn min_archive_len(mut self, len: u64) -> Self {
        self.config.min_archive_len = len;
        self
    }

    /// Keep or delete artifacts after streaming
    pub fn keep_artifacts(mut self, keep: bool) -> Self {
        self.config.keep_artifacts = keep;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent sessions
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the transfer chunk size (in bytes)
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the maximum command line length (in bytes)
    pub fn max_command_len(mut self, len: usize) -> Self {
        self.config.max_command_len = len;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Enable or disable the coordinator hand-off line
    pub fn handshake(mut self, enabled: bool) -> Self {
        self.config.handshake = enabled;
        self
    }

    /// Set the mirror ports sharing the hand-off rotation
    pub fn redirect_ports(mut self, ports: Vec<u16>) -> Self {
        self.config.redirect_ports = ports;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// The invoking user's home directory, or the working directory if unset
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
