//! # Pipeline Replies
//!
//! Purpose: Model the closed set of reply holders a pipeline resolves. Each
//! kind knows how to consume its own framed value from a connection, and a
//! captured server error is stored on the reply instead of aborting the
//! batch — the frame was well-formed, so the replies behind it are still
//! readable.

use crate::connection::Connection;
use crate::error::{Error, Result, ServerError};

/// Reply shapes a pipeline can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Single-line acknowledgement, possibly null.
    Status,
    /// Length-prefixed binary payload, possibly null.
    Bulk,
}

/// A resolved reply. Written exactly once at resolution, read-only after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Status {
        status: Option<Vec<u8>>,
        err: Option<ServerError>,
    },
    Bulk {
        value: Option<Vec<u8>>,
        err: Option<ServerError>,
    },
}

impl Reply {
    /// Consumes one framed value of the given kind from the connection.
    ///
    /// A server-level error becomes part of the returned reply; any other
    /// error is a framing fault and propagates to abort the batch.
    pub(crate) fn read(kind: ReplyKind, conn: &mut Connection) -> Result<Reply> {
        match kind {
            ReplyKind::Status => match conn.read_status() {
                Ok(status) => Ok(Reply::Status {
                    status: status.map(<[u8]>::to_vec),
                    err: None,
                }),
                Err(Error::Server(err)) => Ok(Reply::Status {
                    status: None,
                    err: Some(err),
                }),
                Err(err) => Err(err),
            },
            ReplyKind::Bulk => match conn.read_bulk_bytes() {
                Ok(value) => Ok(Reply::Bulk { value, err: None }),
                Err(Error::Server(err)) => Ok(Reply::Bulk {
                    value: None,
                    err: Some(err),
                }),
                Err(err) => Err(err),
            },
        }
    }

    /// The shape this reply was resolved as.
    pub fn kind(&self) -> ReplyKind {
        match self {
            Reply::Status { .. } => ReplyKind::Status,
            Reply::Bulk { .. } => ReplyKind::Bulk,
        }
    }

    /// Server error captured for this command, if the server rejected it.
    pub fn err(&self) -> Option<&ServerError> {
        match self {
            Reply::Status { err, .. } | Reply::Bulk { err, .. } => err.as_ref(),
        }
    }

    /// Bulk payload; `None` for null bulks, status replies, and errors.
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Reply::Bulk { value, .. } => value.as_deref(),
            Reply::Status { .. } => None,
        }
    }

    /// Status text; `None` for null statuses, bulk replies, and errors.
    pub fn status(&self) -> Option<&[u8]> {
        match self {
            Reply::Status { status, .. } => status.as_deref(),
            Reply::Bulk { .. } => None,
        }
    }
}
