//! Connection Handler
//!
//! Handles individual client sessions.

use std::io::{BufRead, BufReader, BufWriter, Read};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::{Engine, Flow};
use crate::error::{Result, W24Error};

/// One unit read from the command channel
enum Incoming {
    Line(String),
    /// The leading part of an oversized line
    TooLong(String),
    Closed,
}

/// Handles a single client session
pub struct Connection {
    /// TCP stream reader (buffered for line reads)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered; flushed at the end of every frame)
    writer: BufWriter<TcpStream>,

    /// Reference to the protocol engine
    engine: Arc<Engine>,

    /// Peer address for logging
    peer_addr: String,

    /// Session id, also keys this session's artifacts
    session: u64,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, engine: Arc<Engine>, session: u64) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            engine,
            peer_addr,
            session,
        })
    }

    /// Configure connection timeouts (0 leaves the platform default)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the session (blocking until closed)
    ///
    /// Reads one command per line and writes its reply before reading the
    /// next. Returns on `quitc`, on peer close, or on a transport error.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Session {} opened by {}", self.session, self.peer_addr);

        loop {
            let line = match self.read_command() {
                Ok(Incoming::Line(line)) => line,
                Ok(Incoming::TooLong(head)) => {
                    tracing::debug!("Session {}: command too long", self.session);
                    match self.engine.reject_oversized(&head, &mut self.writer) {
                        Ok(()) => continue,
                        Err(e) if e.is_disconnect() => return Ok(()),
                        Err(e) => return Err(e),
                    }
                }
                Ok(Incoming::Closed) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(e) if e.is_disconnect() => {
                    tracing::debug!("Connection from {} dropped: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(W24Error::Io(ref e))
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) =>
                {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, line);

            match self.engine.handle_line(&line, self.session, &mut self.writer) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => {
                    tracing::debug!("Client {} quit", self.peer_addr);
                    return Ok(());
                }
                Err(e) if e.is_disconnect() => {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            }
        }
    }

    /// Read one `\n`-terminated line, bounded by the configured length
    fn read_command(&mut self) -> Result<Incoming> {
        let limit = self.engine.config().max_command_len as u64;
        let mut buf = Vec::new();

        let n = (&mut self.reader).take(limit).read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(Incoming::Closed);
        }

        if buf.last() != Some(&b'\n') && n as u64 == limit {
            // Discard the rest of the oversized line
            loop {
                let mut rest = Vec::new();
                let n = (&mut self.reader).take(limit).read_until(b'\n', &mut rest)?;
                if n == 0 || rest.last() == Some(&b'\n') {
                    break;
                }
            }
            return Ok(Incoming::TooLong(String::from_utf8_lossy(&buf).into_owned()));
        }

        let line = String::from_utf8_lossy(&buf);
        Ok(Incoming::Line(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Get the session id
    pub fn session(&self) -> u64 {
        self.session
    }
}
