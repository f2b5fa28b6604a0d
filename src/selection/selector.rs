//! File selector
//!
//! Runs a [`Selection`] over the regular files under the search root.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use super::Selection;
use crate::error::Result;
use crate::traversal::Walker;

/// Applies selections below a fixed root
#[derive(Debug, Clone)]
pub struct Selector {
    root: PathBuf,
    walker: Walker,
}

impl Selector {
    pub fn new(root: impl Into<PathBuf>, walker: Walker) -> Self {
        Self {
            root: root.into(),
            walker,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cheap existence test: stops at the first matching file
    pub fn any_match(&self, selection: &Selection) -> Result<bool> {
        let mut found = false;
        self.walker.visit_files(&self.root, |entry| {
            if selection.matches(entry) {
                found = true;
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        Ok(found)
    }

    /// Every matching file, sorted by path
    pub fn collect(&self, selection: &Selection) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        self.walker.visit_files(&self.root, |entry| {
            if selection.matches(entry) {
                paths.push(entry.path.clone());
            }
            ControlFlow::Continue(())
        })?;
        paths.sort();
        Ok(paths)
    }
}
