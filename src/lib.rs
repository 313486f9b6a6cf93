//! # kvwire
//!
//! Purpose: Provide a lightweight, synchronous client for RESP-style
//! key-value servers, with connection pooling and pipelining.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: Reuse sockets to avoid repeated connects,
//!    under a hard idle-list ceiling.
//! 2. **Minimal Allocation**: Reuse per-connection buffers for framing and
//!    parsing; integer encoding never touches the heap.
//! 3. **Protocol Clarity**: Encode and parse the framing explicitly, and
//!    discard any connection whose byte stream may have drifted off a frame
//!    boundary.
//! 4. **Exclusive Use by Construction**: A checked-out connection is owned
//!    by exactly one caller or pipeline; the pool's lock covers assignment
//!    only, never I/O.

mod client;
mod commands;
mod connection;
mod error;
mod pipeline;
mod pool;
mod reply;
mod strconv;

pub use client::{
    Client, Config, DEFAULT_MAX_IDLE_CONNECTIONS, DEFAULT_PORT, DEFAULT_TIMEOUT,
};
pub use commands::KeyTtl;
pub use connection::{Arg, Connection};
pub use error::{Error, Result, ServerError};
pub use pipeline::Pipeline;
pub use pool::ServerAddr;
pub use reply::{Reply, ReplyKind};
pub use strconv::{decode_i64, encode_i64};
