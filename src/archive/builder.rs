//! Archive builders
//!
//! The capability that turns a set of paths into one compressed file.
//! The engine only sees the trait, so the packaging format can change
//! without touching the protocol.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{Result, W24Error};

/// Packages files into a single archive on disk
pub trait ArchiveBuilder: Send + Sync {
    /// Write an archive of `files` to `dest`, naming entries relative to
    /// `root`. Returns the archive's length in bytes.
    fn build(&self, root: &Path, files: &[PathBuf], dest: &Path) -> Result<u64>;
}

/// gzip-compressed tar archives
#[derive(Debug, Clone, Copy)]
pub struct TarGzBuilder {
    compression: Compression,
}

impl TarGzBuilder {
    pub fn new(level: u32) -> Self {
        Self {
            compression: Compression::new(level.min(9)),
        }
    }
}

impl Default for TarGzBuilder {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
        }
    }
}

impl ArchiveBuilder for TarGzBuilder {
    fn build(&self, root: &Path, files: &[PathBuf], dest: &Path) -> Result<u64> {
        let writer = BufWriter::new(File::create(dest)?);
        let mut tar = tar::Builder::new(GzEncoder::new(writer, self.compression));
        let mut appended = 0usize;

        for path in files {
            // Files can vanish between selection and packaging
            let mut file = match File::open(path) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!("Leaving {} out of archive: {}", path.display(), e);
                    continue;
                }
            };

            tar.append_file(archive_name(root, path), &mut file)
                .map_err(|e| W24Error::Archive(format!("{}: {}", path.display(), e)))?;
            appended += 1;
        }

        if appended == 0 {
            return Err(W24Error::Archive("none of the selected files could be read".into()));
        }

        let encoder = tar
            .into_inner()
            .map_err(|e| W24Error::Archive(format!("finishing tar stream: {}", e)))?;
        let mut writer = encoder
            .finish()
            .map_err(|e| W24Error::Archive(format!("finishing gzip stream: {}", e)))?;
        writer.flush()?;
        drop(writer);

        let len = fs::metadata(dest)?.len();
        tracing::debug!("Archived {} files into {} ({} bytes)", appended, dest.display(), len);
        Ok(len)
    }
}

/// Entry name for `path`: relative to `root` when below it, otherwise the
/// path with its root and prefix components dropped
pub fn archive_name(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
        _ => path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect(),
    }
}
