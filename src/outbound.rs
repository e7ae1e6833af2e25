use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::encoder::ByteBufPool;

/// Reply bytes accumulated by a connection between flushes.
///
/// Replies are encoded into `current`. When a reply does not fit, the filled buffer is frozen and
/// queued, and a fresh one of at least `minimum_size` bytes takes its place. Nothing reaches the
/// socket until [`OutboundBuffer::flush`].
#[derive(Debug)]
pub struct OutboundBuffer {
    current: Option<BytesMut>,
    queued: VecDeque<Bytes>,
    minimum_size: usize,
}

impl OutboundBuffer {
    pub fn new(minimum_size: usize) -> Self {
        Self {
            current: None,
            queued: VecDeque::new(),
            minimum_size,
        }
    }

    /// Bytes encoded but not yet written.
    pub fn readable_bytes(&self) -> usize {
        self.queued.iter().map(Bytes::len).sum::<usize>()
            + self.current.as_ref().map_or(0, BytesMut::len)
    }

    pub fn is_empty(&self) -> bool {
        self.readable_bytes() == 0
    }

    /// Writes everything buffered so far, in encoding order, and flushes the writer.
    pub async fn flush<W>(&mut self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        if let Some(current) = self.current.take() {
            if !current.is_empty() {
                self.queued.push_back(current.freeze());
            }
        }

        if self.queued.is_empty() {
            return Ok(());
        }

        while let Some(chunk) = self.queued.pop_front() {
            trace!(bytes = chunk.len(), "writing reply chunk");
            if let Err(err) = writer.write_all(&chunk).await {
                self.queued.clear();
                return Err(err);
            }
        }

        writer.flush().await
    }
}

impl ByteBufPool for OutboundBuffer {
    fn acquire(&mut self, size: usize) -> &mut BytesMut {
        let fits = self
            .current
            .as_ref()
            .is_some_and(|current| current.capacity() - current.len() >= size);

        if !fits {
            if let Some(full) = self.current.take() {
                if !full.is_empty() {
                    self.queued.push_back(full.freeze());
                }
            }
            self.current = Some(BytesMut::with_capacity(size.max(self.minimum_size)));
        }

        self.current.get_or_insert_with(BytesMut::new)
    }
}
