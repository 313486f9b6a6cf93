//! Shared mock-server harness for the integration tests.
//!
//! Each test spawns a real `TcpListener` and scripts the server side of the
//! conversation; the handler sees every parsed command together with the
//! index of the connection it arrived on, so tests can assert how many
//! sockets the pool actually dialed.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::thread;
use std::time::Duration;

use kvwire::{Client, Config, ServerAddr};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub struct MockServer {
    pub addr: String,
    accepted: Arc<AtomicUsize>,
    disconnected: Arc<AtomicUsize>,
}

impl MockServer {
    /// Connections accepted so far; one per socket the client dialed.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Connections the client has closed (or the handler hung up on).
    pub fn disconnected(&self) -> usize {
        self.disconnected.load(Ordering::SeqCst)
    }
}

/// Spawns a mock server. `handler(conn_idx, cmd_idx, args, stream)` runs for
/// every parsed command; returning `false` hangs up the connection.
pub fn spawn_server<F>(handler: F) -> MockServer
where
    F: Fn(usize, usize, Vec<Vec<u8>>, &mut TcpStream) -> bool + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr").to_string();
    let accepted = Arc::new(AtomicUsize::new(0));
    let disconnected = Arc::new(AtomicUsize::new(0));
    let handler = Arc::new(handler);

    let accept_counter = accepted.clone();
    let disconnect_counter = disconnected.clone();
    thread::spawn(move || loop {
        let (stream, _) = match listener.accept() {
            Ok(pair) => pair,
            Err(_) => return,
        };
        let conn_idx = accept_counter.fetch_add(1, Ordering::SeqCst);
        let handler = handler.clone();
        let disconnect_counter = disconnect_counter.clone();
        thread::spawn(move || {
            let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
            let mut write_half = stream.try_clone().expect("clone");
            let mut reader = BufReader::new(stream);
            let mut cmd_idx = 0;
            loop {
                let args = match read_command(&mut reader) {
                    Ok(Some(args)) => args,
                    _ => break,
                };
                if !(*handler)(conn_idx, cmd_idx, args, &mut write_half) {
                    break;
                }
                cmd_idx += 1;
            }
            disconnect_counter.fetch_add(1, Ordering::SeqCst);
        });
    });

    MockServer {
        addr,
        accepted,
        disconnected,
    }
}

fn read_command(reader: &mut BufReader<TcpStream>) -> std::io::Result<Option<Vec<Vec<u8>>>> {
    let mut line = Vec::new();
    if read_line(reader, &mut line)?.is_none() {
        return Ok(None);
    }
    if line.first() != Some(&b'*') {
        return Err(invalid("expected array header"));
    }
    let count = parse_usize(&line[1..])?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        if read_line(reader, &mut line)?.is_none() {
            return Err(invalid("eof inside command"));
        }
        if line.first() != Some(&b'$') {
            return Err(invalid("expected bulk header"));
        }
        let len = parse_usize(&line[1..])?;
        let mut data = vec![0u8; len];
        reader.read_exact(&mut data)?;
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf)?;
        if crlf != [b'\r', b'\n'] {
            return Err(invalid("missing crlf"));
        }
        args.push(data);
    }
    Ok(Some(args))
}

fn read_line(reader: &mut BufReader<TcpStream>, buf: &mut Vec<u8>) -> std::io::Result<Option<()>> {
    buf.clear();
    let bytes = reader.read_until(b'\n', buf)?;
    if bytes == 0 {
        return Ok(None);
    }
    if buf.len() < 2 || buf[buf.len() - 2] != b'\r' {
        return Err(invalid("invalid line"));
    }
    buf.truncate(buf.len() - 2);
    Ok(Some(()))
}

fn parse_usize(data: &[u8]) -> std::io::Result<usize> {
    if data.is_empty() {
        return Err(invalid("empty length"));
    }
    let mut value = 0usize;
    for &b in data {
        if !b.is_ascii_digit() {
            return Err(invalid("bad digit"));
        }
        value = value.saturating_mul(10).saturating_add((b - b'0') as usize);
    }
    Ok(value)
}

fn invalid(message: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message.to_string())
}

pub fn write_simple(stream: &mut TcpStream, msg: &str) {
    write_raw(stream, format!("+{msg}\r\n").as_bytes());
}

pub fn write_error(stream: &mut TcpStream, msg: &str) {
    write_raw(stream, format!("-{msg}\r\n").as_bytes());
}

pub fn write_integer(stream: &mut TcpStream, value: i64) {
    write_raw(stream, format!(":{value}\r\n").as_bytes());
}

pub fn write_bulk(stream: &mut TcpStream, data: &[u8]) {
    let _ = stream.write_all(format!("${}\r\n", data.len()).as_bytes());
    let _ = stream.write_all(data);
    let _ = stream.write_all(b"\r\n");
    let _ = stream.flush();
}

pub fn write_null_bulk(stream: &mut TcpStream) {
    write_raw(stream, b"$-1\r\n");
}

pub fn write_array_header(stream: &mut TcpStream, count: i64) {
    write_raw(stream, format!("*{count}\r\n").as_bytes());
}

pub fn write_raw(stream: &mut TcpStream, bytes: &[u8]) {
    let _ = stream.write_all(bytes);
    let _ = stream.flush();
}

pub fn client_for(server: &MockServer) -> Client {
    client_with_max_idle(server, 2)
}

pub fn client_with_max_idle(server: &MockServer, max_idle: usize) -> Client {
    Client::with_config(Config {
        addr: ServerAddr::Tcp(server.addr.clone()),
        max_idle,
        timeout: Some(Duration::from_secs(2)),
    })
}
