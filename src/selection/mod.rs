//! Selection Module
//!
//! Predicate-based file discovery feeding the archive builder.
//!
//! ## Predicate Families
//! - Size range: `min < size < max` bytes
//! - Extension set: name ends with `.<ext>` for one of 1-3 extensions
//! - Date bound: modified on/before end of day, or on/after start of day
//!
//! Only regular, non-hidden files are considered, and the artifact
//! directory is excluded by the walker the engine hands in.

mod predicate;
mod selector;

pub use predicate::{DateBound, ExtensionSet, Selection, SizeRange};
pub use selector::Selector;
