//! Archive Module
//!
//! Builds and scopes the archive produced by each selection request.
//!
//! ## Lifecycle
//! ```text
//! allocate (private path) → build → stream → drop (delete)
//! ```

mod artifact;
mod builder;

pub use artifact::{Artifact, ArtifactStore};
pub use builder::{archive_name, ArchiveBuilder, TarGzBuilder};
