//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Commands (one per `\n`-terminated line)
//! ```text
//! dirlist -a | dirlist -t          → text frame
//! w24fn <name>                     → text frame
//! w24fz <min> <max>                → binary frame | bare message
//! w24ft <ext1> [ext2] [ext3]       → binary frame | bare message
//! w24fdb <YYYY-MM-DD>              → binary frame | bare message
//! w24fda <YYYY-MM-DD>              → binary frame | bare message
//! quitc                            → (session ends)
//! ```
//!
//! ## Responses
//! - Text frame: body + `\nEND_OF_RESPONSE\n`
//! - Binary frame: 8-byte little-endian length + payload
//! - Bare message: short text, nothing else

mod command;
mod response;
mod codec;

pub use command::{is_valid_date, validate_date, Command, CommandType, DirOrder};
pub use response::*;
pub use codec::{
    classify_chunk, decode_length, encode_length, is_plausible_length, read_length,
    read_text_frame, receive_archive, receive_payload, send_archive, write_end_marker,
    write_message, write_text_frame, DEFAULT_CHUNK_SIZE, LENGTH_FIELD_SIZE,
};
