//! Network Module
//!
//! TCP server and per-session handling.
//!
//! ## Architecture
//! - Single non-blocking acceptor loop
//! - One worker thread per session; commands within a session run in order
//! - Optional coordinator hand-off line before the session starts

mod server;
mod connection;

pub use server::Server;
pub use connection::Connection;
