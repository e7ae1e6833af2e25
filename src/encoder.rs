//! RESP2 response encoding.
//!
//! Every function here writes one complete reply element into whatever buffer the
//! [`ByteBufPool`] hands out. They compute the exact encoded size up front so the pool can decide
//! whether the current buffer still fits.

use bytes::{BufMut, Bytes, BytesMut};

const CRLF: &[u8] = b"\r\n";
const OK: &[u8] = b"+OK\r\n";
const NULL_BULK: &[u8] = b"$-1\r\n";
const NULL_ARRAY: &[u8] = b"*-1\r\n";

/// Hands out a buffer with at least `size` writable bytes.
pub trait ByteBufPool {
    fn acquire(&mut self, size: usize) -> &mut BytesMut;
}

impl ByteBufPool for BytesMut {
    fn acquire(&mut self, size: usize) -> &mut BytesMut {
        self.reserve(size);
        self
    }
}

fn decimal_len(n: usize) -> usize {
    n.checked_ilog10().unwrap_or(0) as usize + 1
}

fn write_raw(bytes: &[u8], alloc: &mut dyn ByteBufPool) {
    alloc.acquire(bytes.len()).put_slice(bytes);
}

fn write_prefixed(prefix: u8, line: &[u8], alloc: &mut dyn ByteBufPool) {
    let buf = alloc.acquire(1 + line.len() + CRLF.len());
    buf.put_u8(prefix);
    buf.put_slice(line);
    buf.put_slice(CRLF);
}

pub fn ok(alloc: &mut dyn ByteBufPool) {
    write_raw(OK, alloc);
}

pub fn simple(status: &str, alloc: &mut dyn ByteBufPool) {
    write_prefixed(b'+', status.as_bytes(), alloc);
}

/// `message` carries its own error code prefix, e.g. `ERR` or `WRONGTYPE`.
pub fn error(message: &str, alloc: &mut dyn ByteBufPool) {
    // A stray CRLF would end the error line early and desynchronize the client.
    let line = message.replace(['\r', '\n'], " ");
    write_prefixed(b'-', line.as_bytes(), alloc);
}

pub fn integer(value: i64, alloc: &mut dyn ByteBufPool) {
    write_prefixed(b':', value.to_string().as_bytes(), alloc);
}

/// RESP2 has no double type, so doubles travel as bulk strings.
pub fn double(value: f64, alloc: &mut dyn ByteBufPool) {
    bulk(value.to_string().as_bytes(), alloc);
}

pub fn bulk(value: &[u8], alloc: &mut dyn ByteBufPool) {
    let size = 1 + decimal_len(value.len()) + CRLF.len() + value.len() + CRLF.len();
    let buf = alloc.acquire(size);
    buf.put_u8(b'$');
    buf.put_slice(value.len().to_string().as_bytes());
    buf.put_slice(CRLF);
    buf.put_slice(value);
    buf.put_slice(CRLF);
}

pub fn null_bulk(alloc: &mut dyn ByteBufPool) {
    write_raw(NULL_BULK, alloc);
}

pub fn null_array(alloc: &mut dyn ByteBufPool) {
    write_raw(NULL_ARRAY, alloc);
}

pub fn array_prefix(len: usize, alloc: &mut dyn ByteBufPool) {
    write_prefixed(b'*', len.to_string().as_bytes(), alloc);
}

pub fn bulk_array(values: &[Bytes], alloc: &mut dyn ByteBufPool) {
    array_prefix(values.len(), alloc);
    for value in values {
        bulk(value, alloc);
    }
}

/// One pair of matching ranges in an LCS `IDX` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchRange {
    pub a: (usize, usize),
    pub b: (usize, usize),
    pub len: Option<usize>,
}

/// The `IDX` reply of LCS: `matches`, the match ranges, `len`, and the LCS length.
pub fn lcs_matches(matches: &[MatchRange], len: usize, alloc: &mut dyn ByteBufPool) {
    array_prefix(4, alloc);
    bulk(b"matches", alloc);
    array_prefix(matches.len(), alloc);
    for range in matches {
        array_prefix(if range.len.is_some() { 3 } else { 2 }, alloc);
        array_prefix(2, alloc);
        integer(range.a.0 as i64, alloc);
        integer(range.a.1 as i64, alloc);
        array_prefix(2, alloc);
        integer(range.b.0 as i64, alloc);
        integer(range.b.1 as i64, alloc);
        if let Some(len) = range.len {
            integer(len as i64, alloc);
        }
    }
    bulk(b"len", alloc);
    integer(len as i64, alloc);
}

/// A pub/sub delivery: `*3 message <channel> <payload>`.
pub fn message(channel: &[u8], payload: &[u8], alloc: &mut dyn ByteBufPool) {
    array_prefix(3, alloc);
    bulk(b"message", alloc);
    bulk(channel, alloc);
    bulk(payload, alloc);
}

pub fn subscribed(channel: &[u8], count: usize, alloc: &mut dyn ByteBufPool) {
    array_prefix(3, alloc);
    bulk(b"subscribe", alloc);
    bulk(channel, alloc);
    integer(count as i64, alloc);
}

/// `channel` is `None` for an UNSUBSCRIBE without arguments on a connection with no
/// subscriptions.
pub fn unsubscribed(channel: Option<&[u8]>, count: usize, alloc: &mut dyn ByteBufPool) {
    array_prefix(3, alloc);
    bulk(b"unsubscribe", alloc);
    match channel {
        Some(channel) => bulk(channel, alloc),
        None => null_bulk(alloc),
    }
    integer(count as i64, alloc);
}

/// A typed reply, produced by a command and encoded by the connection that owns the output
/// buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok,
    Simple(String),
    Error(String),
    Integer(i64),
    Double(f64),
    Bulk(Bytes),
    Null,
    NullArray,
    Array(Vec<Reply>),
    Matches { matches: Vec<MatchRange>, len: usize },
    Message { channel: Bytes, payload: Bytes },
    Subscribed { channel: Bytes, count: usize },
    Unsubscribed { channel: Option<Bytes>, count: usize },
    /// Several top-level replies for one request, e.g. one ack per channel.
    Many(Vec<Reply>),
}

impl Reply {
    pub fn bulk(value: impl Into<Bytes>) -> Reply {
        Reply::Bulk(value.into())
    }

    pub fn error(message: impl Into<String>) -> Reply {
        Reply::Error(message.into())
    }

    /// A present value as bulk, an absent one as null bulk.
    pub fn optional(value: Option<Bytes>) -> Reply {
        value.map_or(Reply::Null, Reply::Bulk)
    }

    pub fn bulks(values: Vec<Bytes>) -> Reply {
        Reply::Array(values.into_iter().map(Reply::Bulk).collect())
    }

    pub fn encode(&self, alloc: &mut dyn ByteBufPool) {
        match self {
            Reply::Ok => ok(alloc),
            Reply::Simple(status) => simple(status, alloc),
            Reply::Error(message) => error(message, alloc),
            Reply::Integer(value) => integer(*value, alloc),
            Reply::Double(value) => double(*value, alloc),
            Reply::Bulk(value) => bulk(value, alloc),
            Reply::Null => null_bulk(alloc),
            Reply::NullArray => null_array(alloc),
            Reply::Array(items) => {
                array_prefix(items.len(), alloc);
                for item in items {
                    item.encode(alloc);
                }
            }
            Reply::Matches { matches, len } => lcs_matches(matches, *len, alloc),
            Reply::Message { channel, payload } => message(channel, payload, alloc),
            Reply::Subscribed { channel, count } => subscribed(channel, *count, alloc),
            Reply::Unsubscribed { channel, count } => {
                unsubscribed(channel.as_deref(), *count, alloc)
            }
            Reply::Many(replies) => {
                for reply in replies {
                    reply.encode(alloc);
                }
            }
        }
    }
}
