//! TCP Server
//!
//! Accepts connections and hands each session to its own worker thread.

use std::collections::HashMap;
use std::io::Write;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use super::Connection;
use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A live session, as seen by the accept loop
struct SessionEntry {
    peer: SocketAddr,
    stream: TcpStream,
}

type SessionRegistry = Arc<Mutex<HashMap<u64, SessionEntry>>>;

/// Removes a session from the registry when its worker exits
struct SessionGuard {
    sessions: SessionRegistry,
    session: u64,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(entry) = self.sessions.lock().remove(&self.session) {
            tracing::info!("Session {} with {} closed", self.session, entry.peer);
        }
    }
}

/// Round-robin over this server's port and its mirrors
struct Handoff {
    ports: Vec<u16>,
    next: AtomicUsize,
}

impl Handoff {
    fn next_port(&self) -> u16 {
        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.ports.len();
        self.ports[slot]
    }
}

/// TCP server for w24fs
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    own_port: u16,
    handoff: Handoff,
    sessions: SessionRegistry,
    next_session: AtomicU64,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listening socket
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        let local = listener.local_addr()?;
        let mut ports = vec![local.port()];
        ports.extend(config.redirect_ports.iter().copied());

        tracing::info!("Listening on {} (max {} sessions)", local, config.max_connections);
        if config.handshake {
            tracing::info!("Hand-off rotation: {:?}", ports);
        }

        Ok(Self {
            own_port: local.port(),
            handoff: Handoff {
                ports,
                next: AtomicUsize::new(0),
            },
            config,
            engine,
            listener,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_session: AtomicU64::new(1),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Accept connections until shut down (blocking)
    ///
    /// On shutdown, open sessions are closed and their workers joined.
    pub fn run(&self) -> Result<()> {
        let mut workers: Vec<JoinHandle<()>> = Vec::new();

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, addr)) => match self.accept(stream, addr) {
                    Ok(Some(worker)) => workers.push(worker),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Failed to start session for {}: {}", addr, e),
                },
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::error!("Error accepting connection: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }

            workers.retain(|worker| !worker.is_finished());
        }

        tracing::info!("Shutting down, closing {} sessions", self.active_sessions());
        for entry in self.sessions.lock().values() {
            let _ = entry.stream.shutdown(Shutdown::Both);
        }
        for worker in workers {
            let _ = worker.join();
        }

        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Flag that stops the accept loop when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// The bound address (useful when listening on port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Number of sessions currently being served
    pub fn active_sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Hand-off, admission and worker start for one accepted connection
    fn accept(&self, stream: TcpStream, addr: SocketAddr) -> Result<Option<JoinHandle<()>>> {
        stream.set_nonblocking(false)?;

        if self.config.handshake {
            let port = self.handoff.next_port();
            (&stream).write_all(format!("{}\n", port).as_bytes())?;
            if port != self.own_port {
                tracing::info!("Handed {} off to port {}", addr, port);
                return Ok(None);
            }
        }

        let session = self.next_session.fetch_add(1, Ordering::Relaxed);
        {
            let mut sessions = self.sessions.lock();
            if sessions.len() >= self.config.max_connections {
                tracing::warn!(
                    "Refusing {}: {} sessions already active",
                    addr,
                    sessions.len()
                );
                return Ok(None);
            }
            sessions.insert(
                session,
                SessionEntry {
                    peer: addr,
                    stream: stream.try_clone()?,
                },
            );
            tracing::info!(
                "Session {} opened for {} ({}/{})",
                session,
                addr,
                sessions.len(),
                self.config.max_connections
            );
        }

        let guard = SessionGuard {
            sessions: Arc::clone(&self.sessions),
            session,
        };
        let engine = Arc::clone(&self.engine);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        let worker = thread::Builder::new()
            .name(format!("w24-session-{}", session))
            .spawn(move || {
                let _guard = guard;
                let mut connection = match Connection::new(stream, engine, session) {
                    Ok(connection) => connection,
                    Err(e) => {
                        tracing::warn!("Session {} setup failed: {}", session, e);
                        return;
                    }
                };
                if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
                    tracing::warn!("Session {}: cannot set timeouts: {}", session, e);
                }
                if let Err(e) = connection.handle() {
                    tracing::warn!("Session {} ended with error: {}", session, e);
                }
            })?;

        Ok(Some(worker))
    }
}
