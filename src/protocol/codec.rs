//! Protocol codec
//!
//! Framing for everything the server writes back on a session.
//!
//! ## Wire Format
//!
//! ### Text Frame (listings, file lookup)
//! ```text
//! ┌─────────────────────────────┬───────────────────────┐
//! │     Body (any length)       │ \nEND_OF_RESPONSE\n   │
//! └─────────────────────────────┴───────────────────────┘
//! ```
//!
//! ### Binary Frame (archives)
//! ```text
//! ┌──────────────┬──────────────────────────────────────┐
//! │ Len (8, LE)  │  Payload (exactly Len bytes, chunked)│
//! └──────────────┴──────────────────────────────────────┘
//! ```
//!
//! ### Bare Message (archive commands that produced nothing)
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │ Text, no length, no terminator                       │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Binary frames and bare messages share the same leading bytes with no
//! type tag. See [`classify_chunk`] for how a receiver tells them apart.

use std::fs::File;
use std::io::{BufRead, BufWriter, ErrorKind, Read, Write};
use std::path::Path;

use bytes::{Bytes, BytesMut};

use super::response::{FrameKind, END_MARKER};
use crate::error::{Result, W24Error};

/// Size of the length field that opens a binary frame
pub const LENGTH_FIELD_SIZE: usize = 8;

/// Default upper bound on bytes moved per read/write
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// The END marker as it appears as a line of its own
const END_LINE: &[u8] = b"END_OF_RESPONSE\n";

// =============================================================================
// Text Frames
// =============================================================================

/// Write a complete text frame: body followed by the END marker
pub fn write_text_frame<W: Write>(writer: &mut W, body: &[u8]) -> Result<()> {
    writer.write_all(body)?;
    write_end_marker(writer)
}

/// Terminate a text frame whose body was already streamed
pub fn write_end_marker<W: Write>(writer: &mut W) -> Result<()> {
    writer.write_all(END_MARKER)?;
    writer.flush()?;
    Ok(())
}

/// Write a bare message (no length, no terminator)
pub fn write_message<W: Write>(writer: &mut W, message: &str) -> Result<()> {
    writer.write_all(message.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read a text frame and return its body with the END marker stripped.
///
/// Reads line by line so nothing past the marker is consumed, and a marker
/// split across TCP segments is still recognised.
pub fn read_text_frame<R: BufRead>(reader: &mut R) -> Result<Bytes> {
    let mut body = BytesMut::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            return Err(W24Error::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "connection closed before end of response",
            )));
        }

        // The marker starts with '\n', so it only counts when the
        // preceding line was complete
        if line == END_LINE && body.last() == Some(&b'\n') {
            body.truncate(body.len() - 1);
            return Ok(body.freeze());
        }

        body.extend_from_slice(&line);
    }
}

// =============================================================================
// Binary Frames
// =============================================================================

/// Encode a payload length as the 8-byte wire field
pub fn encode_length(len: u64) -> [u8; LENGTH_FIELD_SIZE] {
    (len as i64).to_le_bytes()
}

/// Decode the 8-byte wire field as a signed length
pub fn decode_length(bytes: [u8; LENGTH_FIELD_SIZE]) -> i64 {
    i64::from_le_bytes(bytes)
}

/// Stream `len` bytes from `source` as a binary frame.
///
/// Writes the length field, then moves at most `chunk_size` bytes per step
/// until the declared length is sent. A source that runs dry first aborts
/// the transfer.
pub fn send_archive<W: Write, R: Read>(
    writer: &mut W,
    source: &mut R,
    len: u64,
    chunk_size: usize,
) -> Result<u64> {
    writer.write_all(&encode_length(len))?;

    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut sent = 0u64;

    while sent < len {
        let want = (len - sent).min(buffer.len() as u64) as usize;
        let n = match source.read(&mut buffer[..want]) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            return Err(W24Error::IncompleteTransfer {
                expected: len,
                received: sent,
            });
        }
        writer.write_all(&buffer[..n])?;
        sent += n as u64;
    }

    writer.flush()?;
    Ok(sent)
}

/// Read exactly one length field
pub fn read_length<R: Read>(reader: &mut R) -> Result<i64> {
    let mut field = [0u8; LENGTH_FIELD_SIZE];
    reader.read_exact(&mut field)?;
    Ok(decode_length(field))
}

/// Receive exactly `len` payload bytes into `dest` (created or truncated).
///
/// Never reads past `len`. If the peer closes first, the partial file is
/// left in place and `IncompleteTransfer` is returned.
pub fn receive_payload<R: Read>(
    reader: &mut R,
    len: u64,
    dest: &Path,
    chunk_size: usize,
) -> Result<u64> {
    let mut file = BufWriter::new(File::create(dest)?);
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut received = 0u64;

    while received < len {
        let want = (len - received).min(buffer.len() as u64) as usize;
        let n = match reader.read(&mut buffer[..want]) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            file.flush()?;
            return Err(W24Error::IncompleteTransfer {
                expected: len,
                received,
            });
        }
        file.write_all(&buffer[..n])?;
        received += n as u64;
    }

    file.flush()?;
    Ok(received)
}

/// Receive a complete binary frame (length field + payload) into `dest`
pub fn receive_archive<R: Read>(reader: &mut R, dest: &Path, chunk_size: usize) -> Result<u64> {
    let declared = read_length(reader)?;
    if declared <= 0 {
        return Err(W24Error::Protocol(format!(
            "Declared archive length is not positive: {}",
            declared
        )));
    }
    receive_payload(reader, declared as u64, dest, chunk_size)
}

// =============================================================================
// Disambiguation
// =============================================================================

/// True if `len` could be a real archive length
pub fn is_plausible_length(len: i64, max_len: u64) -> bool {
    len > 0 && (len as u64) <= max_len
}

/// Decide whether the first chunk of an archive reply opens a binary frame.
///
/// There is no type tag on the wire: the first eight bytes are read as a
/// little-endian length, and anything plausible is taken as binary.
///
/// Known hazard: a text message whose first eight bytes happen to decode to
/// a value in `1..=max_len` is misclassified as binary. Printable ASCII in
/// the eighth byte puts the value at or above 2^61, so the server's own
/// messages are safe at any sane `max_len`; arbitrary text is not. Fixing
/// this needs a frame-type byte, which breaks wire compatibility with
/// existing clients.
pub fn classify_chunk(chunk: &[u8], max_len: u64) -> FrameKind {
    if chunk.len() < LENGTH_FIELD_SIZE {
        return FrameKind::Text;
    }

    let mut field = [0u8; LENGTH_FIELD_SIZE];
    field.copy_from_slice(&chunk[..LENGTH_FIELD_SIZE]);
    let len = decode_length(field);

    if is_plausible_length(len, max_len) {
        FrameKind::Binary { len: len as u64 }
    } else {
        FrameKind::Text
    }
}
