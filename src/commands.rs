//! # Command Wrappers
//!
//! Purpose: Marshal arguments for the individual key-value commands and
//! dispatch them through the typed request helpers. Each wrapper is thin;
//! the framing contract lives in the connection layer.

use std::borrow::Cow;
use std::time::Duration;

use crate::client::Client;
use crate::connection::Arg;
use crate::error::{Error, Result};

pub(crate) const OK_STATUS: &[u8] = b"OK";
pub(crate) const PONG_STATUS: &[u8] = b"PONG";

/// TTL state reported by the server for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key does not exist.
    Missing,
    /// Key exists without an expiration.
    NoExpiry,
    /// Key expires after this duration.
    ExpiresIn(Duration),
}

enum SetMode {
    Always,
    IfMissing,
    IfExists,
}

impl Client {
    /// Fetches a value by key. `None` when the key is missing.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.bulk_request("GET", &[Arg::Str(key)])
    }

    /// Sets a value, optionally with an expiration. Whole-second durations
    /// are sent as `EX` seconds, anything finer as `PX` milliseconds.
    pub fn set(&self, key: &str, value: &[u8], expire: Option<Duration>) -> Result<()> {
        self.set_with_mode(key, value, expire, SetMode::Always)
            .map(|_| ())
    }

    /// Sets a value only if the key does not exist. Returns whether the
    /// write happened.
    pub fn set_nx(&self, key: &str, value: &[u8], expire: Option<Duration>) -> Result<bool> {
        self.set_with_mode(key, value, expire, SetMode::IfMissing)
    }

    /// Sets a value only if the key already exists. Returns whether the
    /// write happened.
    pub fn set_xx(&self, key: &str, value: &[u8], expire: Option<Duration>) -> Result<bool> {
        self.set_with_mode(key, value, expire, SetMode::IfExists)
    }

    fn set_with_mode(
        &self,
        key: &str,
        value: &[u8],
        expire: Option<Duration>,
        mode: SetMode,
    ) -> Result<bool> {
        let mut args: Vec<Arg<'_>> = vec![Arg::Str(key), Arg::Bytes(value)];
        if let Some(ttl) = expire {
            let ms = ttl.as_millis() as i64;
            if ms % 1000 == 0 {
                args.push(Arg::Str("EX"));
                args.push(Arg::Duration(ttl));
            } else {
                args.push(Arg::Str("PX"));
                args.push(Arg::Int(ms));
            }
        }
        match mode {
            SetMode::Always => {}
            SetMode::IfMissing => args.push(Arg::Str("NX")),
            SetMode::IfExists => args.push(Arg::Str("XX")),
        }

        // A null status is the conditional-miss outcome, not a failure; any
        // non-OK status text is a protocol-level surprise.
        let status = self.status_request("SET", &args)?;
        match status {
            Some(ref s) if s.as_slice() != OK_STATUS => Err(Error::InvalidStatus),
            _ => Ok(status.is_some()),
        }
    }

    /// Increments the integer value stored at `key`, returning the new value.
    pub fn incr(&self, key: &str) -> Result<i64> {
        self.integer_request("INCR", &[Arg::Str(key)])
    }

    /// Decrements the integer value stored at `key`, returning the new value.
    pub fn decr(&self, key: &str) -> Result<i64> {
        self.integer_request("DECR", &[Arg::Str(key)])
    }

    /// Deletes a key. Returns whether a key was removed.
    pub fn del(&self, key: &str) -> Result<bool> {
        Ok(self.integer_request("DEL", &[Arg::Str(key)])? > 0)
    }

    /// Attaches an expiration to a key. Returns whether the TTL was set.
    pub fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        Ok(self.integer_request("EXPIRE", &[Arg::Str(key), Arg::Duration(ttl)])? == 1)
    }

    /// Reports the TTL state of a key.
    pub fn ttl(&self, key: &str) -> Result<KeyTtl> {
        match self.integer_request("TTL", &[Arg::Str(key)])? {
            -2 => Ok(KeyTtl::Missing),
            -1 => Ok(KeyTtl::NoExpiry),
            secs if secs >= 0 => Ok(KeyTtl::ExpiresIn(Duration::from_secs(secs as u64))),
            _ => Err(Error::InvalidValue),
        }
    }

    /// Fetches several keys in one round trip; missing keys come back as
    /// `None` at their position.
    pub fn mget(&self, keys: &[&str]) -> Result<Vec<Option<Vec<u8>>>> {
        self.with_connection(|conn| {
            let args: Vec<Arg<'_>> = keys.iter().map(|&k| Arg::Str(k)).collect();
            conn.send_command("MGET", &args);
            conn.flush()?;
            let count = conn.read_array_count()?.max(0) as usize;
            let mut out = Vec::with_capacity(count);
            for _ in 0..count {
                out.push(conn.read_bulk_bytes()?);
            }
            Ok(out)
        })
    }

    /// Round-trips a payload through the server.
    pub fn echo(&self, message: &[u8]) -> Result<Option<Vec<u8>>> {
        self.with_connection(|conn| {
            conn.send_command("ECHO", &[Arg::Bytes(message)]);
            conn.flush()?;
            Ok(conn.read_bulk_str()?.map(Cow::into_owned))
        })
    }

    /// Pings the server, expecting `PONG` back.
    pub fn ping(&self) -> Result<()> {
        match self.status_request("PING", &[])? {
            Some(ref status) if status.as_slice() == PONG_STATUS => Ok(()),
            _ => Err(Error::InvalidStatus),
        }
    }

    /// Switches the connection's database index, expecting `OK` back.
    pub fn select(&self, index: i64) -> Result<()> {
        match self.status_request("SELECT", &[Arg::Int(index)])? {
            Some(ref status) if status.as_slice() == OK_STATUS => Ok(()),
            _ => Err(Error::InvalidStatus),
        }
    }

    /// Asks the server to close the connection.
    pub fn quit(&self) -> Result<()> {
        self.status_request("QUIT", &[])?;
        Ok(())
    }

    /// Starts a background append-only-file rewrite.
    pub fn bg_rewrite_aof(&self) -> Result<()> {
        self.status_request("BGREWRITEAOF", &[])?;
        Ok(())
    }
}
