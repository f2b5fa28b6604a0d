//! Client Module
//!
//! The client side of a session: validates command lines locally, sends
//! them, and interprets the reply in the framing each command uses.

use std::io::{BufRead, BufReader, BufWriter, Cursor, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::path::PathBuf;

use bytes::{Bytes, BytesMut};

use crate::error::{Result, W24Error};
use crate::protocol::{
    classify_chunk, decode_length, is_plausible_length, read_text_frame, receive_payload, Command,
    CommandType, FrameKind, DEFAULT_CHUNK_SIZE, LENGTH_FIELD_SIZE,
};

/// Default coordinator address
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8084";

/// Default download path for received archives
pub const DEFAULT_DOWNLOAD_PATH: &str = "temp.tar.gz";

/// Largest length field accepted as binary (1 TiB)
pub const DEFAULT_MAX_ARCHIVE_LEN: u64 = 1 << 40;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Coordinator (or server) address
    pub server_addr: String,

    /// Expect a hand-off port line after connecting
    pub handshake: bool,

    /// Where received archives are written (overwritten each time)
    pub download_path: PathBuf,

    /// Receive buffer size
    pub chunk_size: usize,

    /// Upper bound used to tell binary frames from text
    pub max_archive_len: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            handshake: true,
            download_path: PathBuf::from(DEFAULT_DOWNLOAD_PATH),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_archive_len: DEFAULT_MAX_ARCHIVE_LEN,
        }
    }
}

/// An interpreted server reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Body of a text frame, terminator removed
    Text(String),

    /// Archive saved to `path`
    Archive { path: PathBuf, len: u64 },

    /// Bare message sent instead of an archive
    Message(String),

    /// The session was closed with `quitc`
    Closed,
}

/// A connected client session
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    config: ClientConfig,
    server_addr: SocketAddr,
    closed: bool,
}

impl Client {
    /// Connect, following a coordinator hand-off if one is expected.
    ///
    /// With `handshake` set, the first line from the server names the port
    /// that will serve the session. A different port means reconnecting to
    /// the same host on that port.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let stream = TcpStream::connect(&config.server_addr)?;
        let peer = stream.peer_addr()?;

        if !config.handshake {
            return Self::from_stream(stream, config);
        }

        let mut reader = BufReader::new(stream.try_clone()?);
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(W24Error::Network(
                "Connection closed during hand-off".to_string(),
            ));
        }
        let port: u16 = line.trim().parse().map_err(|_| {
            W24Error::Protocol(format!("Hand-off line is not a port: {:?}", line.trim()))
        })?;

        if port == peer.port() {
            tracing::debug!("Served directly by {}", peer);
            return Self::from_parts(reader, stream, config);
        }

        drop(reader);
        drop(stream);

        let target = SocketAddr::new(peer.ip(), port);
        tracing::info!("Handed off from {} to {}", peer, target);
        let stream = TcpStream::connect(target)?;
        Self::from_stream(stream, config)
    }

    fn from_stream(stream: TcpStream, config: ClientConfig) -> Result<Self> {
        let reader = BufReader::new(stream.try_clone()?);
        Self::from_parts(reader, stream, config)
    }

    fn from_parts(
        reader: BufReader<TcpStream>,
        stream: TcpStream,
        config: ClientConfig,
    ) -> Result<Self> {
        stream.set_nodelay(true)?;
        let server_addr = stream.peer_addr()?;
        Ok(Self {
            reader,
            writer: BufWriter::new(stream),
            config,
            server_addr,
            closed: false,
        })
    }

    /// Address of the server actually serving this session
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Get the configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Validate and send one command line, then read its reply.
    ///
    /// Malformed lines fail with `Validation` before anything is sent.
    pub fn request(&mut self, line: &str) -> Result<Reply> {
        let command = Command::parse(line)?;
        self.execute(&command)
    }

    /// Send `quitc` and close the session
    pub fn send_quit(&mut self) -> Result<Reply> {
        self.execute(&Command::Quit)
    }

    /// Send an already parsed command and read its reply
    pub fn execute(&mut self, command: &Command) -> Result<Reply> {
        if self.closed {
            return Err(W24Error::Network("Session already closed".to_string()));
        }

        self.writer.write_all(command.to_line().as_bytes())?;
        self.writer.flush()?;

        match command.command_type() {
            CommandType::Quit => {
                self.closed = true;
                let _ = self.writer.get_ref().shutdown(Shutdown::Both);
                Ok(Reply::Closed)
            }
            CommandType::DirList | CommandType::FindFile => {
                let body = read_text_frame(&mut self.reader)?;
                Ok(Reply::Text(String::from_utf8_lossy(&body).into_owned()))
            }
            CommandType::SizeRange => self.receive_prefixed(),
            CommandType::Extensions | CommandType::DateBefore | CommandType::DateAfter => {
                self.receive_sniffed()
            }
        }
    }

    /// `w24fz` replies: read the length field first, then decide
    fn receive_prefixed(&mut self) -> Result<Reply> {
        let mut field = [0u8; LENGTH_FIELD_SIZE];
        self.reader.read_exact(&mut field)?;

        let declared = decode_length(field);
        if is_plausible_length(declared, self.config.max_archive_len) {
            let len = receive_payload(
                &mut self.reader,
                declared as u64,
                &self.config.download_path,
                self.config.chunk_size,
            )?;
            return Ok(self.archive_reply(len));
        }

        // A message arrives in a single write; the rest is already buffered
        let mut text = field.to_vec();
        let rest = self.reader.buffer().to_vec();
        self.reader.consume(rest.len());
        text.extend_from_slice(&rest);

        Ok(Reply::Message(String::from_utf8_lossy(&text).into_owned()))
    }

    /// `w24ft`, `w24fdb`, `w24fda` replies: classify the first chunk
    fn receive_sniffed(&mut self) -> Result<Reply> {
        let chunk_size = self.config.chunk_size.max(LENGTH_FIELD_SIZE);
        let mut chunk = BytesMut::zeroed(chunk_size);
        let mut filled = 0;

        // Every reply is at least one length field long
        while filled < LENGTH_FIELD_SIZE {
            let n = self.reader.read(&mut chunk[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Server closed the connection",
            )
            .into());
        }
        chunk.truncate(filled);
        let chunk: Bytes = chunk.freeze();

        match classify_chunk(&chunk, self.config.max_archive_len) {
            FrameKind::Binary { len } => {
                let received = {
                    let head = chunk.slice(LENGTH_FIELD_SIZE..);
                    let mut source = Cursor::new(head).chain(&mut self.reader);
                    receive_payload(
                        &mut source,
                        len,
                        &self.config.download_path,
                        self.config.chunk_size,
                    )?
                };
                Ok(self.archive_reply(received))
            }
            FrameKind::Text => Ok(Reply::Message(String::from_utf8_lossy(&chunk).into_owned())),
        }
    }

    fn archive_reply(&self, len: u64) -> Reply {
        tracing::debug!(
            "Received {} bytes into {}",
            len,
            self.config.download_path.display()
        );
        Reply::Archive {
            path: self.config.download_path.clone(),
            len,
        }
    }
}
