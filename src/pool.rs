//! # Connection Pool
//!
//! Purpose: Reuse sockets across requests under a bounded idle list, and
//! decide whether a returned connection is safe to keep or must be closed.
//!
//! ## Design Principles
//! 1. **Explicit Ownership**: The pool is a value owned by its client; there
//!    is no process-wide singleton.
//! 2. **Minimal Locking**: The mutex covers only the pop/push bookkeeping;
//!    dialing and all I/O happen outside it.
//! 3. **Hard Ceiling**: The idle list never exceeds its capacity; surplus
//!    returns are closed instead of queued.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
#[cfg(unix)]
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use crate::connection::{Connection, Stream};
use crate::error::{Error, Result};

/// Server endpoint: a TCP address or, on Unix targets, a socket path.
#[derive(Debug, Clone)]
pub enum ServerAddr {
    /// `host:port`; a bare host gets the default port at client construction.
    Tcp(String),
    /// Path to a Unix domain socket.
    #[cfg(unix)]
    Unix(PathBuf),
}

pub(crate) struct Pool {
    addr: ServerAddr,
    timeout: Option<Duration>,
    max_idle: usize,
    idle: Mutex<Vec<Connection>>,
}

impl Pool {
    pub(crate) fn new(addr: ServerAddr, max_idle: usize, timeout: Option<Duration>) -> Pool {
        Pool {
            addr,
            timeout,
            max_idle,
            idle: Mutex::new(Vec::with_capacity(max_idle)),
        }
    }

    /// Hands out an idle connection, most recently released first (its
    /// kernel socket caches are the warmest), or dials a fresh one.
    pub(crate) fn acquire(&self) -> Result<Connection> {
        if let Some(conn) = self.idle.lock().expect("pool mutex poisoned").pop() {
            return Ok(conn);
        }
        self.dial()
    }

    /// Takes a connection back after a request.
    ///
    /// A clean outcome or a server-level reply leaves the framing intact, so
    /// the connection is pooled while the idle list is below capacity. Any
    /// framing fault closes it unconditionally: its byte stream can no
    /// longer be trusted to sit at a frame boundary.
    pub(crate) fn release(&self, conn: Connection, outcome: Option<&Error>) {
        if let Some(err) = outcome {
            if !err.connection_reusable() {
                tracing::debug!(error = %err, "discarding connection after framing fault");
                return;
            }
        }
        let mut idle = self.idle.lock().expect("pool mutex poisoned");
        if idle.len() < self.max_idle {
            idle.push(conn);
        }
        // At capacity the connection drops here, closing the socket.
    }

    fn dial(&self) -> Result<Connection> {
        tracing::debug!(addr = ?self.addr, "dialing new connection");
        let stream = match &self.addr {
            ServerAddr::Tcp(addr) => {
                let stream = match self.timeout {
                    Some(timeout) => {
                        let sockaddr = addr.to_socket_addrs()?.next().ok_or_else(|| {
                            io::Error::new(
                                io::ErrorKind::AddrNotAvailable,
                                "address resolved to nothing",
                            )
                        })?;
                        TcpStream::connect_timeout(&sockaddr, timeout)?
                    }
                    None => TcpStream::connect(addr.as_str())?,
                };
                Stream::Tcp(stream)
            }
            #[cfg(unix)]
            ServerAddr::Unix(path) => Stream::Unix(UnixStream::connect(path)?),
        };
        Ok(Connection::new(stream, self.timeout)?)
    }
}
