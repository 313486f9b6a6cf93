//! # Client Facade
//!
//! Purpose: Tie the pool, the wire codec, and the command layer together
//! behind a compact blocking API.
//!
//! Every single-shot request funnels through [`Client::with_connection`],
//! which routes the connection back through the pool's reuse-or-discard
//! policy, so callers never see a socket whose framing has drifted.

use std::time::Duration;

use crate::connection::{Arg, Connection};
use crate::pipeline::Pipeline;
use crate::pool::{Pool, ServerAddr};
use crate::error::Result;

/// Port assumed when a TCP address omits one.
pub const DEFAULT_PORT: u16 = 6379;

/// Idle connections kept for reuse unless configured otherwise.
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 6;

/// Socket deadline applied unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Client configuration. Fixed at construction time.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server endpoint.
    pub addr: ServerAddr,
    /// Maximum idle connections kept in the pool.
    pub max_idle: usize,
    /// Connect/read/write deadline applied to every socket; `None` blocks
    /// indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: ServerAddr::Tcp(format!("127.0.0.1:{DEFAULT_PORT}")),
            max_idle: DEFAULT_MAX_IDLE_CONNECTIONS,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// Synchronous client with connection pooling.
///
/// Construction does not dial; sockets are opened lazily on first use and
/// then recycled through the pool.
pub struct Client {
    pub(crate) pool: Pool,
}

impl Client {
    /// Creates a client for a TCP address with default configuration. An
    /// address without a port gets [`DEFAULT_PORT`].
    pub fn connect(addr: impl Into<String>) -> Client {
        Client::with_config(Config {
            addr: ServerAddr::Tcp(addr.into()),
            ..Config::default()
        })
    }

    /// Creates a client with explicit configuration.
    pub fn with_config(mut config: Config) -> Client {
        if let ServerAddr::Tcp(addr) = &mut config.addr {
            if !addr.contains(':') {
                addr.push_str(&format!(":{DEFAULT_PORT}"));
            }
        }
        Client {
            pool: Pool::new(config.addr, config.max_idle, config.timeout),
        }
    }

    /// Runs `op` on a pooled connection and routes the connection back
    /// through the release policy: reused on success or a server-level
    /// error, closed on any framing fault.
    ///
    /// This is the extension point for commands the wrappers do not cover.
    pub fn with_connection<T>(&self, op: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.pool.acquire()?;
        let outcome = op(&mut conn);
        self.pool.release(conn, outcome.as_ref().err());
        outcome
    }

    /// Issues a command and reads a status reply. `None` is the null status
    /// conditional command variants answer with.
    pub fn status_request(&self, cmd: &str, args: &[Arg<'_>]) -> Result<Option<Vec<u8>>> {
        self.with_connection(|conn| {
            conn.send_command(cmd, args);
            conn.flush()?;
            Ok(conn.read_status()?.map(<[u8]>::to_vec))
        })
    }

    /// Issues a command and reads an integer reply.
    pub fn integer_request(&self, cmd: &str, args: &[Arg<'_>]) -> Result<i64> {
        self.with_connection(|conn| {
            conn.send_command(cmd, args);
            conn.flush()?;
            conn.read_integer()
        })
    }

    /// Issues a command and reads a bulk reply. `None` for the null bulk.
    pub fn bulk_request(&self, cmd: &str, args: &[Arg<'_>]) -> Result<Option<Vec<u8>>> {
        self.with_connection(|conn| {
            conn.send_command(cmd, args);
            conn.flush()?;
            conn.read_bulk_bytes()
        })
    }

    /// Checks one connection out of the pool and opens a pipeline over it.
    /// The connection is bound exclusively to the pipeline until it
    /// resolves.
    pub fn pipeline(&self) -> Result<Pipeline<'_>> {
        let conn = self.pool.acquire()?;
        Ok(Pipeline::new(self, conn))
    }
}
