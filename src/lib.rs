//! # w24fs
//!
//! A remote file-query and retrieval service with:
//! - Streamed directory listings, alphabetical or by creation time
//! - File lookup by exact name with an info record reply
//! - Predicate-selected tar.gz archives (size, extension, date)
//! - Length-prefixed binary transfer and marker-terminated text frames
//! - Thread-per-session TCP server with optional coordinator hand-off
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TCP Server                            │
//! │           (hand-off rotation, one thread / session)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ command lines
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Protocol Engine                            │
//! │          (parse, dispatch, frame the reply)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Traversal  │◄─────────│  Selection  │
//!   │  (Walker)   │          │ (Predicates)│
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Archive   │
//!                           │  (tar.gz)   │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod traversal;
pub mod selection;
pub mod archive;
pub mod engine;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{W24Error, Result};
pub use config::Config;
pub use engine::{Engine, Flow};
pub use client::{Client, ClientConfig, Reply};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of w24fs
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
