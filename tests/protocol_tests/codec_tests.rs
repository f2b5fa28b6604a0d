//! Tests for response framing
//!
//! These tests verify:
//! - Text frames end with the END marker and read back without it
//! - Binary frames carry an exact little-endian length
//! - Receivers never read past the declared payload
//! - First-chunk classification of archive replies

use std::io::{self, Cursor, Read, Write};

use tempfile::TempDir;
use w24fs::protocol::{
    classify_chunk, encode_length, read_length, read_text_frame, receive_archive,
    receive_payload, send_archive, write_end_marker, write_message, write_text_frame, FrameKind,
    ARCHIVE_FAILED, COMMAND_TOO_LONG, END_MARKER, INVALID_DATE, INVALID_SIZE_RANGE,
    NO_EXTENSION_MATCH, NO_FILE_FOUND, NO_MATCH_AFTER, NO_MATCH_BEFORE, SEARCH_FAILED,
};
use w24fs::W24Error;

const MAX_LEN: u64 = 1 << 40;

/// Records the size of every write call
#[derive(Default)]
struct RecordingWriter {
    data: Vec<u8>,
    writes: Vec<usize>,
}

impl Write for RecordingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes.push(buf.len());
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Text Frame Tests
// =============================================================================

#[test]
fn test_text_frame_layout() {
    let mut out = Vec::new();
    write_text_frame(&mut out, b"File not found\n").unwrap();
    assert_eq!(out, b"File not found\n\nEND_OF_RESPONSE\n".to_vec());
    assert!(out.ends_with(END_MARKER));
}

#[test]
fn test_text_frame_read_back() {
    let mut out = Vec::new();
    write_text_frame(&mut out, b"/home/a\n/home/b\n").unwrap();

    let body = read_text_frame(&mut Cursor::new(out)).unwrap();
    assert_eq!(&body[..], b"/home/a\n/home/b\n");
}

#[test]
fn test_text_frame_without_trailing_newline() {
    let mut out = Vec::new();
    write_text_frame(&mut out, b"abc").unwrap();

    let body = read_text_frame(&mut Cursor::new(out)).unwrap();
    assert_eq!(&body[..], b"abc");
}

#[test]
fn test_empty_listing_frame() {
    let mut out = Vec::new();
    write_end_marker(&mut out).unwrap();

    let body = read_text_frame(&mut Cursor::new(out)).unwrap();
    assert!(body.is_empty());
}

#[test]
fn test_consecutive_frames_do_not_bleed() {
    let mut out = Vec::new();
    write_text_frame(&mut out, b"first\n").unwrap();
    write_text_frame(&mut out, b"second\n").unwrap();

    let mut reader = Cursor::new(out);
    assert_eq!(&read_text_frame(&mut reader).unwrap()[..], b"first\n");
    assert_eq!(&read_text_frame(&mut reader).unwrap()[..], b"second\n");
}

#[test]
fn test_marker_mid_line_is_body() {
    let mut out = Vec::new();
    write_text_frame(&mut out, b"xEND_OF_RESPONSE\n").unwrap();

    let body = read_text_frame(&mut Cursor::new(out)).unwrap();
    assert_eq!(&body[..], b"xEND_OF_RESPONSE\n");
}

#[test]
fn test_truncated_text_frame_is_eof() {
    let result = read_text_frame(&mut Cursor::new(b"/home/a\n/home/b\n".to_vec()));
    match result {
        Err(W24Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
        other => panic!("expected EOF, got {:?}", other),
    }
}

#[test]
fn test_bare_message_has_no_framing() {
    let mut out = Vec::new();
    write_message(&mut out, NO_FILE_FOUND).unwrap();
    assert_eq!(out, b"No file found".to_vec());
}

// =============================================================================
// Binary Frame Tests
// =============================================================================

#[test]
fn test_send_archive_exact_length() {
    let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
    let mut out = Vec::new();

    let sent = send_archive(&mut out, &mut Cursor::new(&payload), payload.len() as u64, 1024)
        .unwrap();

    assert_eq!(sent, 5000);
    assert_eq!(out.len(), 8 + 5000);
    assert_eq!(&out[..8], &encode_length(5000));
    assert_eq!(&out[8..], &payload[..]);
}

#[test]
fn test_send_archive_respects_chunk_size() {
    let payload = vec![7u8; 4096 + 13];
    let mut out = RecordingWriter::default();

    send_archive(&mut out, &mut Cursor::new(&payload), payload.len() as u64, 1024).unwrap();

    assert!(out.writes.iter().all(|&n| n <= 1024));
    assert_eq!(out.data.len(), 8 + payload.len());
}

#[test]
fn test_send_archive_stops_at_declared_length() {
    let payload = vec![1u8; 100];
    let mut source = Cursor::new(&payload);
    let mut out = Vec::new();

    send_archive(&mut out, &mut source, 60, 16).unwrap();

    assert_eq!(out.len(), 8 + 60);
    assert_eq!(source.position(), 60);
}

#[test]
fn test_send_archive_short_source() {
    let payload = vec![1u8; 10];
    let mut out = Vec::new();

    let result = send_archive(&mut out, &mut Cursor::new(&payload), 20, 1024);
    assert!(matches!(
        result,
        Err(W24Error::IncompleteTransfer {
            expected: 20,
            received: 10
        })
    ));
}

#[test]
fn test_read_length() {
    let mut reader = Cursor::new(encode_length(123_456).to_vec());
    assert_eq!(read_length(&mut reader).unwrap(), 123_456);
}

#[test]
fn test_receive_payload_leaves_trailing_bytes() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("out.tar.gz");

    let mut wire = b"0123456789".to_vec();
    wire.extend_from_slice(b"NEXT");
    let mut reader = Cursor::new(wire);

    let received = receive_payload(&mut reader, 10, &dest, 3).unwrap();
    assert_eq!(received, 10);
    assert_eq!(std::fs::read(&dest).unwrap(), b"0123456789".to_vec());

    let mut rest = String::new();
    reader.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "NEXT");
}

#[test]
fn test_receive_payload_early_close() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("out.tar.gz");

    let result = receive_payload(&mut Cursor::new(vec![0u8; 5]), 10, &dest, 1024);
    assert!(matches!(
        result,
        Err(W24Error::IncompleteTransfer {
            expected: 10,
            received: 5
        })
    ));
}

#[test]
fn test_receive_archive_overwrites_destination() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("temp.tar.gz");
    std::fs::write(&dest, vec![9u8; 500]).unwrap();

    let mut wire = Vec::new();
    send_archive(&mut wire, &mut Cursor::new(b"abc"), 3, 1024).unwrap();

    let len = receive_archive(&mut Cursor::new(wire), &dest, 1024).unwrap();
    assert_eq!(len, 3);
    assert_eq!(std::fs::read(&dest).unwrap(), b"abc".to_vec());
}

#[test]
fn test_receive_archive_rejects_non_positive_length() {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("temp.tar.gz");

    let wire = (-4i64).to_le_bytes().to_vec();
    let result = receive_archive(&mut Cursor::new(wire), &dest, 1024);
    assert!(matches!(result, Err(W24Error::Protocol(_))));
}

// =============================================================================
// Classification Tests
// =============================================================================

#[test]
fn test_classify_binary_chunk() {
    let mut chunk = encode_length(4096).to_vec();
    chunk.extend_from_slice(&[0x1f, 0x8b, 0x08]);

    assert_eq!(classify_chunk(&chunk, MAX_LEN), FrameKind::Binary { len: 4096 });
}

#[test]
fn test_classify_server_messages_as_text() {
    for message in [
        NO_FILE_FOUND,
        INVALID_SIZE_RANGE,
        NO_EXTENSION_MATCH,
        NO_MATCH_BEFORE,
        NO_MATCH_AFTER,
        ARCHIVE_FAILED,
        SEARCH_FAILED,
        INVALID_DATE,
        COMMAND_TOO_LONG,
    ] {
        assert_eq!(
            classify_chunk(message.as_bytes(), MAX_LEN),
            FrameKind::Text,
            "{:?}",
            message
        );
    }
}

#[test]
fn test_classify_short_zero_and_oversized() {
    assert_eq!(classify_chunk(b"tiny", MAX_LEN), FrameKind::Text);
    assert_eq!(classify_chunk(&encode_length(0), MAX_LEN), FrameKind::Text);
    assert_eq!(classify_chunk(&encode_length(MAX_LEN + 1), MAX_LEN), FrameKind::Text);
    assert_eq!(
        classify_chunk(&encode_length(MAX_LEN), MAX_LEN),
        FrameKind::Binary { len: MAX_LEN }
    );
}
