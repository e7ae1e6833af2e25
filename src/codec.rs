use bytes::{Buf, Bytes, BytesMut};
use std::convert::TryInto;
use std::fmt;
use std::io::Cursor;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::frame::{self, Frame};
use crate::Error;

/// One decoded client request: the command name and its arguments, in order.
#[derive(Clone, PartialEq)]
pub struct Request {
    pub name: Bytes,
    pub args: Vec<Bytes>,
}

impl Request {
    pub fn new(name: impl Into<Bytes>, args: Vec<Bytes>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.name))?;
        for arg in &self.args {
            write!(f, " {:?}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}

impl TryFrom<Frame> for Request {
    type Error = frame::Error;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the server as RESP arrays of bulk strings.
        let frames = match frame {
            Frame::Array(frames) => frames,
            _ => return Err(frame::Error::Invalid("expected '*'")),
        };

        let mut parts = frames.into_iter().map(|frame| match frame {
            Frame::Bulk(bytes) => Ok(bytes),
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Integer(i) => Ok(Bytes::from(i.to_string())),
            _ => Err(frame::Error::Invalid("expected bulk string")),
        });

        let name = parts
            .next()
            .ok_or(frame::Error::Invalid("empty command"))??;
        let args = parts.collect::<Result<Vec<_>, _>>()?;

        Ok(Self { name, args })
    }
}

pub struct RequestCodec {
    max_frame_size: usize,
}

impl RequestCodec {
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }
}

impl Decoder for RequestCodec {
    type Item = Request;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Check if the frame size exceeds a certain limit to prevent DoS attacks
        if src.len() > self.max_frame_size {
            return Err("Protocol error: frame size exceeds limit".into());
        }

        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            Err(frame::Error::Incomplete) => return Ok(None), // Not enough data to parse a frame.
            Err(err) => return Err(err.into()),
        };

        let position: usize = cursor.position().try_into()?;

        // Remove the parsed frame from the buffer.
        src.advance(position);

        let request = Request::try_from(frame)?;
        trace!(?request, "decoded request");

        Ok(Some(request))
    }
}
