// https://redis.io/docs/reference/protocol-spec

use bytes::Buf;
use bytes::Bytes;
use std::fmt;
use std::io::Cursor;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError, PartialEq)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("Protocol error: invalid frame data type {0}")]
    InvalidDataType(u8),
    #[error("Protocol error: {0}")]
    Invalid(&'static str),
}

/// A single RESP value read from a client.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

// Protocol specification: https://redis.io/docs/reference/protocol-spec/
impl Frame {
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        // The first byte in an RESP-serialized payload always identifies its type.
        // Subsequent bytes constitute the type's contents.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => Ok(Frame::Simple(get_string(src)?)),
            DataType::SimpleError => Ok(Frame::Error(get_string(src)?)),
            DataType::Integer => {
                let integer = get_string(src)?
                    .parse::<i64>()
                    .map_err(|_| Error::Invalid("invalid integer"))?;

                Ok(Frame::Integer(integer))
            }
            // $<length>\r\n<data>\r\n
            DataType::BulkString => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(length) => Ok(Frame::Bulk(get_exact(src, length)?)),
            },
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => match get_length(src)? {
                None => Ok(Frame::Null),
                Some(length) => {
                    let mut frames = Vec::with_capacity(length.min(1024));
                    for _ in 0..length {
                        frames.push(Self::parse(src)?);
                    }
                    Ok(Frame::Array(frames))
                }
            },
            DataType::Null => {
                // Advance the cursor to the end of the frame.
                get_line(src)?;
                Ok(Frame::Null)
            }
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(arr) => {
                write!(f, "*{}", arr.len())?;
                for frame in arr {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
        }
    }
}

fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let buf: &'a [u8] = *src.get_ref();

    let end = buf[start..]
        .windows(2)
        .position(|window| window == CRLF)
        .map(|index| start + index)
        .ok_or(Error::Incomplete)?;

    src.set_position((end + CRLF.len()) as u64);

    Ok(&buf[start..end])
}

fn get_string(src: &mut Cursor<&[u8]>) -> Result<String, Error> {
    let line = get_line(src)?;
    String::from_utf8(line.to_vec()).map_err(|_| Error::Invalid("invalid frame format"))
}

/// Reads a length header. `-1` is the RESP2 null marker.
fn get_length(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, Error> {
    let length = get_string(src)?
        .parse::<i64>()
        .map_err(|_| Error::Invalid("invalid length"))?;

    match length {
        -1 => Ok(None),
        length if length < 0 => Err(Error::Invalid("invalid length")),
        length => Ok(Some(length as usize)),
    }
}

/// Bulk payloads are length-prefixed, so they may contain CRLF themselves.
fn get_exact(src: &mut Cursor<&[u8]>, length: usize) -> Result<Bytes, Error> {
    if src.remaining() < length + CRLF.len() {
        return Err(Error::Incomplete);
    }

    let start = src.position() as usize;
    let data = &src.get_ref()[start..start + length];
    if &src.get_ref()[start + length..start + length + CRLF.len()] != CRLF {
        return Err(Error::Invalid("bulk string is not terminated by CRLF"));
    }

    let data = Bytes::copy_from_slice(data);
    src.advance(length + CRLF.len());

    Ok(data)
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    SimpleError,  // '-'
    Integer,      // ':'
    BulkString,   // '$'
    Array,        // '*'
    Null,         // '_'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'*' => Ok(Self::Array),
            b'_' => Ok(Self::Null),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}
