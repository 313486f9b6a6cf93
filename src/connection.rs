//! # Wire Codec and Connection
//!
//! Purpose: Own one socket and speak the RESP framing over it — marker-byte
//! replies, CRLF-terminated lines, length-prefixed bulk payloads — with
//! buffer reuse on the hot paths.
//!
//! ## Design Principles
//! 1. **Explicit Flush**: Write operations only append to a buffer; the
//!    caller decides when a batch hits the socket.
//! 2. **Buffer Reuse**: A fixed scratch buffer serves small bulk reads; the
//!    borrowed view it returns is invalidated by the next read.
//! 3. **Fail Fast**: Any framing violation surfaces immediately and marks
//!    the stream as no longer trustworthy.

use std::borrow::Cow;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::Duration;

use crate::error::{Error, Result, ServerError};
use crate::strconv;

pub(crate) const STATUS_MARKER: u8 = b'+';
pub(crate) const ERROR_MARKER: u8 = b'-';
pub(crate) const INTEGER_MARKER: u8 = b':';
pub(crate) const BULK_MARKER: u8 = b'$';
pub(crate) const ARRAY_MARKER: u8 = b'*';

const EOL: &[u8] = b"\r\n";

/// Scratch buffer size; also the longest reply line accepted.
pub(crate) const CONNECTION_BUFFER_SIZE: usize = 1024;

/// Transport under a connection. Unix sockets speak the same framing.
pub(crate) enum Stream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Stream {
    fn set_timeouts(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => {
                s.set_read_timeout(timeout)?;
                s.set_write_timeout(timeout)
            }
            #[cfg(unix)]
            Stream::Unix(s) => {
                s.set_read_timeout(timeout)?;
                s.set_write_timeout(timeout)
            }
        }
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.read(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Tcp(s) => s.write(buf),
            #[cfg(unix)]
            Stream::Unix(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Tcp(s) => s.flush(),
            #[cfg(unix)]
            Stream::Unix(s) => s.flush(),
        }
    }
}

/// Command argument kinds accepted by the serializer.
///
/// The set is closed: an unsupported argument kind cannot be expressed, so
/// a command either serializes completely or not at all. Durations are sent
/// as whole seconds, the protocol's native TTL unit.
#[derive(Debug, Clone)]
pub enum Arg<'a> {
    Int(i64),
    Duration(Duration),
    Bytes(&'a [u8]),
    Str(&'a str),
}

impl From<i64> for Arg<'static> {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<Duration> for Arg<'static> {
    fn from(v: Duration) -> Self {
        Arg::Duration(v)
    }
}

impl<'a> From<&'a [u8]> for Arg<'a> {
    fn from(v: &'a [u8]) -> Self {
        Arg::Bytes(v)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(v: &'a str) -> Self {
        Arg::Str(v)
    }
}

/// One socket with its buffered reader, pending write buffer, and reusable
/// scratch buffer.
///
/// A connection is owned by exactly one caller (or one pipeline) between
/// pool checkout and release; exclusivity is enforced by ownership.
pub struct Connection {
    reader: BufReader<Stream>,
    write_buf: Vec<u8>,
    line_buf: Vec<u8>,
    scratch: Vec<u8>,
}

impl Connection {
    pub(crate) fn new(stream: Stream, timeout: Option<Duration>) -> io::Result<Connection> {
        stream.set_timeouts(timeout)?;
        if let Stream::Tcp(s) = &stream {
            // Small request/reply payloads; Nagle only adds latency here.
            s.set_nodelay(true)?;
        }
        Ok(Connection {
            reader: BufReader::new(stream),
            write_buf: Vec::with_capacity(CONNECTION_BUFFER_SIZE),
            line_buf: Vec::with_capacity(128),
            scratch: vec![0; CONNECTION_BUFFER_SIZE],
        })
    }

    /// Sends every buffered write to the socket in one pass.
    pub fn flush(&mut self) -> io::Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buf)?;
        stream.flush()?;
        self.write_buf.clear();
        Ok(())
    }

    // Write path. These append to the write buffer and never flush, so a
    // batch of commands coalesces into a single network write.

    fn write_i64(&mut self, marker: u8, v: i64) {
        let mut buf = [0u8; 20];
        let digits = strconv::encode_i64(v, &mut buf);
        self.write_buf.push(marker);
        self.write_buf.extend_from_slice(digits);
        self.write_buf.extend_from_slice(EOL);
    }

    /// Emits an integer reply frame (`:` marker).
    pub fn write_integer(&mut self, v: i64) {
        self.write_i64(INTEGER_MARKER, v);
    }

    /// Emits an array-count header (`*` marker).
    pub fn write_array_count(&mut self, count: usize) {
        self.write_i64(ARRAY_MARKER, count as i64);
    }

    /// Emits a bulk frame: length header, raw payload, terminator.
    pub fn write_bulk(&mut self, v: &[u8]) {
        self.write_i64(BULK_MARKER, v.len() as i64);
        self.write_buf.extend_from_slice(v);
        self.write_buf.extend_from_slice(EOL);
    }

    /// Emits a bulk frame holding an integer rendered as ASCII decimal.
    pub fn write_bulk_i64(&mut self, v: i64) {
        let mut buf = [0u8; 20];
        let digits = strconv::encode_i64(v, &mut buf);
        self.write_bulk(digits);
    }

    /// Emits a status frame (`+` marker).
    pub fn write_status(&mut self, status: &str) {
        self.write_buf.push(STATUS_MARKER);
        self.write_buf.extend_from_slice(status.as_bytes());
        self.write_buf.extend_from_slice(EOL);
    }

    /// Serializes a full command: array-count header, the command name, then
    /// each argument bulk-encoded. Nothing reaches the socket until `flush`.
    pub fn send_command(&mut self, cmd: &str, args: &[Arg<'_>]) {
        self.write_array_count(1 + args.len());
        self.write_bulk(cmd.as_bytes());
        for arg in args {
            match arg {
                Arg::Int(v) => self.write_bulk_i64(*v),
                Arg::Duration(d) => self.write_bulk_i64(d.as_secs() as i64),
                Arg::Bytes(v) => self.write_bulk(v),
                Arg::Str(s) => self.write_bulk(s.as_bytes()),
            }
        }
    }

    // Read path.

    fn read_marker(&mut self) -> Result<u8> {
        let mut marker = [0u8; 1];
        self.reader.read_exact(&mut marker)?;
        Ok(marker[0])
    }

    /// Reads one CRLF-terminated line into the line buffer, rejecting lines
    /// longer than the receive buffer.
    fn read_line(&mut self) -> Result<()> {
        self.line_buf.clear();
        let limit = (CONNECTION_BUFFER_SIZE + 2) as u64;
        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.line_buf)? as u64;
        if self.line_buf.last() != Some(&b'\n') {
            if n == limit {
                return Err(Error::InvalidValue);
            }
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed mid-line",
            )));
        }
        self.line_buf.pop();
        if self.line_buf.last() != Some(&b'\r') {
            return Err(Error::InvalidValue);
        }
        self.line_buf.pop();
        Ok(())
    }

    /// Generic integer-framed read, shared by `:` replies and `*` count
    /// headers. Returns the decoded value together with the marker actually
    /// seen so callers can validate it against the read they requested.
    ///
    /// An error marker is surfaced as [`Error::Server`], distinct from the
    /// marker mismatch it would otherwise report.
    pub fn read_i64(&mut self) -> Result<(i64, u8)> {
        let marker = self.read_marker()?;
        if marker == ERROR_MARKER {
            self.read_line()?;
            return Err(Error::Server(ServerError::parse(&self.line_buf)));
        }
        self.read_line()?;
        let value = strconv::decode_i64(&self.line_buf)?;
        Ok((value, marker))
    }

    /// Reads an integer reply, rejecting any other marker.
    pub fn read_integer(&mut self) -> Result<i64> {
        let (value, marker) = self.read_i64()?;
        if marker != INTEGER_MARKER {
            return Err(Error::InvalidReplyMarker);
        }
        Ok(value)
    }

    /// Reads an array-count header. `-1` denotes a null array.
    pub fn read_array_count(&mut self) -> Result<i64> {
        let (count, marker) = self.read_i64()?;
        if marker != ARRAY_MARKER {
            return Err(Error::InvalidReplyMarker);
        }
        Ok(count)
    }

    /// Reads a bulk reply into a freshly sized buffer. `None` for the null
    /// bulk (`$-1`).
    pub fn read_bulk_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        let (len, marker) = self.read_i64()?;
        if len < 0 {
            return Ok(None);
        }
        if marker != BULK_MARKER {
            return Err(Error::InvalidReplyMarker);
        }
        let len = len as usize;
        let mut data = vec![0u8; len + 2];
        self.reader.read_exact(&mut data)?;
        if &data[len..] != EOL {
            return Err(Error::InvalidValue);
        }
        data.truncate(len);
        Ok(Some(data))
    }

    /// Reads a bulk reply, reusing the connection scratch buffer when the
    /// payload fits.
    ///
    /// The borrowed form aliases the scratch buffer and is valid only until
    /// the next read on this connection; call `into_owned` to retain it.
    /// Oversized payloads come back as a one-off owned buffer, never
    /// truncated.
    pub fn read_bulk_str(&mut self) -> Result<Option<Cow<'_, [u8]>>> {
        let (len, marker) = self.read_i64()?;
        if len < 0 {
            return Ok(None);
        }
        if marker != BULK_MARKER {
            return Err(Error::InvalidReplyMarker);
        }
        let len = len as usize;
        let total = len + 2;
        if total <= self.scratch.len() {
            self.reader.read_exact(&mut self.scratch[..total])?;
            if &self.scratch[len..total] != EOL {
                return Err(Error::InvalidValue);
            }
            Ok(Some(Cow::Borrowed(&self.scratch[..len])))
        } else {
            let mut data = vec![0u8; total];
            self.reader.read_exact(&mut data)?;
            if &data[len..] != EOL {
                return Err(Error::InvalidValue);
            }
            data.truncate(len);
            Ok(Some(Cow::Owned(data)))
        }
    }

    /// Reads a status reply line. `None` is the null status that conditional
    /// command variants answer with (a bulk `-1` header).
    ///
    /// The returned slice aliases the line buffer and is valid only until
    /// the next read on this connection.
    pub fn read_status(&mut self) -> Result<Option<&[u8]>> {
        let marker = self.read_marker()?;
        self.read_line()?;
        match marker {
            STATUS_MARKER => Ok(Some(&self.line_buf)),
            ERROR_MARKER => Err(Error::Server(ServerError::parse(&self.line_buf))),
            BULK_MARKER if self.line_buf[..] == b"-1"[..] => Ok(None),
            _ => Err(Error::InvalidReplyMarker),
        }
    }
}
