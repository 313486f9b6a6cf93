//! # Error Taxonomy
//!
//! Purpose: Classify every failure the client can surface, and in particular
//! separate server-level reply errors (the stream framing is intact) from
//! framing faults (the byte stream can no longer be trusted).

use std::fmt;
use std::io;

use thiserror::Error;

/// Result type for the client.
pub type Result<T> = std::result::Result<T, Error>;

/// A well-formed error reply from the server (a `-` frame).
///
/// The server explicitly reported a failure; the connection is still
/// positioned at a frame boundary and remains reusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    tag: String,
    message: String,
}

impl ServerError {
    /// Splits an error line like `ERR unknown command` into tag and message.
    pub(crate) fn parse(line: &[u8]) -> ServerError {
        let text = String::from_utf8_lossy(line);
        match text.split_once(' ') {
            Some((tag, message)) => ServerError {
                tag: tag.to_string(),
                message: message.to_string(),
            },
            None => ServerError {
                tag: text.into_owned(),
                message: String::new(),
            },
        }
    }

    /// Error class reported by the server, e.g. `ERR` or `WRONGTYPE`.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Human-readable remainder of the error line.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "server {}: {}", self.tag, self.message)
    }
}

impl std::error::Error for ServerError {}

/// Errors surfaced by the client.
#[derive(Debug, Error)]
pub enum Error {
    /// Network or I/O failure while dialing, reading, or writing.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// A reply began with a marker byte inconsistent with the requested read.
    #[error("invalid reply marker")]
    InvalidReplyMarker,
    /// Malformed integer text, a missing terminator, or a reply line longer
    /// than the receive buffer.
    #[error("invalid value")]
    InvalidValue,
    /// A status reply was well-formed but did not match the sentinel the
    /// command expected.
    #[error("invalid status reply")]
    InvalidStatus,
    /// The server answered with an error reply.
    #[error("{0}")]
    Server(#[from] ServerError),
}

impl Error {
    /// True when the connection's framing survived this error and the socket
    /// may go back to the idle pool. Everything else desyncs the stream.
    pub(crate) fn connection_reusable(&self) -> bool {
        matches!(self, Error::Server(_) | Error::InvalidStatus)
    }
}
