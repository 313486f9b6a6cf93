//! # Pipelining
//!
//! Purpose: Batch several commands onto one exclusively held connection,
//! flush them in a single network write, and resolve the replies in
//! lock-step with submission order.

use crate::client::Client;
use crate::connection::{Arg, Connection};
use crate::error::Result;
use crate::reply::{Reply, ReplyKind};

/// A batch of commands bound to one pooled connection.
///
/// Enqueuing serializes into the connection's write buffer without touching
/// the socket. [`Pipeline::resolve`] consumes the pipeline, so enqueuing or
/// resolving after resolution is a compile-time error. Dropping an
/// unresolved pipeline closes its connection rather than pooling
/// buffered-but-unflushed bytes.
pub struct Pipeline<'a> {
    client: &'a Client,
    conn: Connection,
    pending: Vec<ReplyKind>,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(client: &'a Client, conn: Connection) -> Pipeline<'a> {
        Pipeline {
            client,
            conn,
            pending: Vec::new(),
        }
    }

    /// Enqueues an arbitrary command whose reply resolves as `kind`.
    pub fn cmd(&mut self, cmd: &str, args: &[Arg<'_>], kind: ReplyKind) {
        self.conn.send_command(cmd, args);
        self.pending.push(kind);
    }

    /// Enqueues a `GET`; the reply resolves as a bulk value.
    pub fn get(&mut self, key: &str) {
        self.cmd("GET", &[Arg::Str(key)], ReplyKind::Bulk);
    }

    /// Enqueues a `SET`; the reply resolves as a status.
    pub fn set(&mut self, key: &str, value: &[u8]) {
        self.cmd("SET", &[Arg::Str(key), Arg::Bytes(value)], ReplyKind::Status);
    }

    /// Number of commands enqueued so far.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Flushes the whole batch in one write, then reads every reply in
    /// enqueue order.
    ///
    /// Captured server errors land on their individual replies and do not
    /// stop resolution. The first framing fault does: the connection is
    /// discarded, the error is returned, and the unread tail of the batch
    /// is lost.
    pub fn resolve(self) -> Result<Vec<Reply>> {
        let Pipeline {
            client,
            mut conn,
            pending,
        } = self;
        let outcome = resolve_on(&mut conn, &pending);
        client.pool.release(conn, outcome.as_ref().err());
        outcome
    }
}

fn resolve_on(conn: &mut Connection, pending: &[ReplyKind]) -> Result<Vec<Reply>> {
    conn.flush()?;
    let mut replies = Vec::with_capacity(pending.len());
    for &kind in pending {
        replies.push(Reply::read(kind, conn)?);
    }
    Ok(replies)
}
