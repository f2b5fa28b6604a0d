//! Archive artifacts
//!
//! Every archive request gets its own file, named by session and a
//! process-wide sequence number, so concurrent sessions never share one.
//! An [`Artifact`] deletes its file when dropped unless told to keep it.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;

/// Allocates private artifact paths inside one directory
#[derive(Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
    next_seq: AtomicU64,
    keep: bool,
}

impl ArtifactStore {
    /// Open the store, creating its directory if needed
    pub fn open(dir: impl Into<PathBuf>, keep: bool) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            next_seq: AtomicU64::new(1),
            keep,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserve a fresh path for one request of `session`
    pub fn allocate(&self, session: u64) -> Artifact {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.join(format!("session{}-{}.tar.gz", session, seq));
        Artifact {
            path,
            len: 0,
            keep: self.keep,
        }
    }
}

/// One request's archive file, scoped to the request
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    len: u64,
    keep: bool,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Record the length reported by the builder
    pub fn set_len(&mut self, len: u64) {
        self.len = len;
    }

    pub fn open(&self) -> io::Result<File> {
        File::open(&self.path)
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::trace!("Removed artifact {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove artifact {}: {}", self.path.display(), e),
        }
    }
}
