//! Directory walker
//!
//! Depth-first walks over the search root using an explicit stack, so deep
//! trees cost heap, not call frames. Hidden entries are never yielded or
//! descended into. Subtrees that cannot be read are logged and skipped.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use super::entry::{read_entries, sort_entries, DirectoryEntry};
use crate::error::Result;
use crate::protocol::DirOrder;

/// Bounded, stack-based directory walker
#[derive(Debug, Clone)]
pub struct Walker {
    /// Deepest level descended into (the root is level 0)
    max_depth: usize,

    /// Directories treated as if they did not exist
    excluded: Vec<PathBuf>,
}

impl Walker {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            excluded: Vec::new(),
        }
    }

    /// Skip `path` (and everything below it) in every walk
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.iter().any(|p| p == path)
    }

    /// Visit every directory under `root`, parent before children, siblings
    /// in `order`. `visit` runs as each directory is discovered; an error
    /// from it stops the walk and is returned.
    ///
    /// Returns the number of directories visited. Fails only when `root`
    /// itself cannot be read.
    pub fn list_directories<F>(&self, root: &Path, order: DirOrder, mut visit: F) -> Result<usize>
    where
        F: FnMut(&DirectoryEntry) -> Result<()>,
    {
        let mut stack: Vec<(DirectoryEntry, usize)> = Vec::new();
        let mut visited = 0;

        for child in self.subdirectories(root, order)?.into_iter().rev() {
            stack.push((child, 1));
        }

        while let Some((dir, depth)) = stack.pop() {
            visit(&dir)?;
            visited += 1;

            if depth >= self.max_depth {
                tracing::debug!("Depth limit {} reached at {}", self.max_depth, dir.path.display());
                continue;
            }

            match self.subdirectories(&dir.path, order) {
                Ok(children) => {
                    for child in children.into_iter().rev() {
                        stack.push((child, depth + 1));
                    }
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory {}: {}", dir.path.display(), e);
                }
            }
        }

        Ok(visited)
    }

    /// Find the first non-directory entry named exactly `name`.
    ///
    /// Which match wins when several exist is not specified; the search
    /// stops at the first one. Not finding anything is `None`, not an error.
    pub fn find_file(&self, root: &Path, name: &str) -> Option<DirectoryEntry> {
        let mut stack: Vec<(PathBuf, usize)> = vec![(root.to_path_buf(), 0)];

        while let Some((dir, depth)) = stack.pop() {
            let entries = match read_entries(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                    continue;
                }
            };

            for entry in entries {
                if entry.is_dir() {
                    if depth < self.max_depth && !self.is_excluded(&entry.path) {
                        stack.push((entry.path, depth + 1));
                    }
                } else if entry.name == name {
                    return Some(entry);
                }
            }
        }

        None
    }

    /// Visit every regular file under `root` until `visit` breaks.
    ///
    /// Fails only when `root` itself cannot be read.
    pub fn visit_files<F>(&self, root: &Path, mut visit: F) -> Result<()>
    where
        F: FnMut(&DirectoryEntry) -> ControlFlow<()>,
    {
        let mut stack: Vec<(PathBuf, usize)> = Vec::new();
        let mut pending = Some(read_entries(root)?);
        let mut depth = 0;

        loop {
            let entries = match pending.take() {
                Some(entries) => entries,
                None => match stack.pop() {
                    Some((dir, dir_depth)) => {
                        depth = dir_depth;
                        match read_entries(&dir) {
                            Ok(entries) => entries,
                            Err(e) => {
                                tracing::warn!(
                                    "Skipping unreadable directory {}: {}",
                                    dir.display(),
                                    e
                                );
                                continue;
                            }
                        }
                    }
                    None => return Ok(()),
                },
            };

            for entry in entries {
                if entry.is_dir() {
                    if depth < self.max_depth && !self.is_excluded(&entry.path) {
                        stack.push((entry.path, depth + 1));
                    }
                } else if entry.is_file() {
                    if let ControlFlow::Break(()) = visit(&entry) {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Readable, non-hidden, non-excluded subdirectories of `dir`, sorted
    fn subdirectories(&self, dir: &Path, order: DirOrder) -> std::io::Result<Vec<DirectoryEntry>> {
        let mut dirs: Vec<DirectoryEntry> = read_entries(dir)?
            .into_iter()
            .filter(|e| e.is_dir() && !self.is_excluded(&e.path))
            .collect();
        sort_entries(&mut dirs, order);
        Ok(dirs)
    }
}

impl Default for Walker {
    fn default() -> Self {
        Self::new(256)
    }
}
