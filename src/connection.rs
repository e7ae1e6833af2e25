use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, Receiver};
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, trace};
use uuid::Uuid;

use crate::codec::{Request, RequestCodec};
use crate::config::Config;
use crate::encoder::Reply;
use crate::handler::{Completion, Dispatch, RequestHandler, RespHandler};
use crate::outbound::OutboundBuffer;
use crate::pubsub::Delivery;
use crate::store::Store;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Reading and answering requests.
    Idle,
    /// A request is waiting on the store. Reading is paused until it resolves.
    AwaitingAsyncResult,
    Closed,
}

enum Inbound {
    Request(Option<Result<Request, Error>>),
    Delivery(Delivery),
}

/// One client connection.
///
/// Requests are answered strictly in arrival order. Replies are encoded into an outbound buffer
/// that is written out when the reader runs out of buffered requests, when a request has to wait
/// on the store, or when the buffer grows past the write budget.
pub struct Connection<R, W> {
    pub id: Uuid,
    reader: FramedRead<R, RequestCodec>,
    writer: W,
    outbound: OutboundBuffer,
    // Taken while a request is being handled, put back by its completion.
    handler: Option<RequestHandler>,
    state: State,
    auto_read: bool,
    deliveries: Receiver<Delivery>,
    write_budget: usize,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, store: Arc<dyn Store>, config: &Config) -> Self {
        let (sender, deliveries) = mpsc::channel(config.delivery_queue_capacity.max(1));

        Connection {
            id: Uuid::new_v4(),
            reader: FramedRead::new(reader, RequestCodec::new(config.max_frame_size)),
            writer,
            outbound: OutboundBuffer::new(config.minimum_buffer_size),
            handler: Some(RequestHandler::Resp(RespHandler::new(store, sender))),
            state: State::Idle,
            auto_read: true,
            deliveries,
            write_budget: config.write_buffer_high_water_mark,
        }
    }

    /// Serves the connection until the client goes away, asks to quit, or a fatal error occurs.
    ///
    /// A fatal error is answered with a server error reply before the connection closes. Either
    /// way the handler is disconnected, releasing its pub/sub listeners.
    pub async fn run(mut self) -> Result<(), Error> {
        let result = self.process().await;

        if let Err(err) = &result {
            error!(%err, "closing connection after server error");
            Reply::error(format!("ERR Server Error Encountered: {}", err)).encode(&mut self.outbound);
        }

        self.close().await;
        result
    }

    async fn process(&mut self) -> Result<(), Error> {
        while self.state != State::Closed {
            if !self.auto_read {
                self.flush().await?;
                self.writability_changed();
            }

            let inbound = match self.reader.next().now_or_never() {
                Some(request) => Inbound::Request(request),
                None => {
                    // Every buffered request has been handled.
                    self.flush().await?;

                    // Queued messages go out before the next request is read.
                    tokio::select! {
                        biased;
                        Some(delivery) = self.deliveries.recv() => Inbound::Delivery(delivery),
                        request = self.reader.next() => Inbound::Request(request),
                    }
                }
            };

            match inbound {
                Inbound::Request(Some(request)) => self.dispatch(request?).await?,
                Inbound::Request(None) => {
                    debug!("client closed the connection");
                    self.state = State::Closed;
                }
                Inbound::Delivery(delivery) => self.deliver(delivery),
            }
        }

        Ok(())
    }

    async fn dispatch(&mut self, request: Request) -> Result<(), Error> {
        let handler = self
            .handler
            .take()
            .ok_or("connection has no request handler")?;

        trace!(?request, "dispatching request");

        match handler.handle(request) {
            Dispatch::Ready(result) => self.complete(result?),
            Dispatch::Pending(mut future) => match (&mut future).now_or_never() {
                Some(result) => self.complete(result?),
                None => {
                    self.state = State::AwaitingAsyncResult;
                    self.auto_read = false;
                    trace!("awaiting asynchronous result, reading paused");

                    // Deliveries that arrive meanwhile are held until the next handler is
                    // known, it decides whether they are still wanted.
                    let mut held = Vec::new();
                    let completion = loop {
                        tokio::select! {
                            biased;
                            result = &mut future => break result?,
                            Some(delivery) = self.deliveries.recv() => held.push(delivery),
                        }
                    };

                    self.complete(completion);
                    for delivery in held {
                        self.deliver(delivery);
                    }
                    if self.state == State::AwaitingAsyncResult {
                        self.state = State::Idle;
                    }
                    self.flush().await?;
                    self.auto_read = true;
                }
            },
        }

        if self.outbound.readable_bytes() > self.write_budget {
            trace!(
                bytes = self.outbound.readable_bytes(),
                "write budget exceeded, reading paused"
            );
            self.auto_read = false;
            self.flush().await?;
            self.writability_changed();
        }

        Ok(())
    }

    fn complete(&mut self, completion: Completion) {
        completion.reply.encode(&mut self.outbound);

        if !completion.handler.is_subscriber() {
            let mut dropped = 0;
            while self.deliveries.try_recv().is_ok() {
                dropped += 1;
            }
            if dropped > 0 {
                trace!(dropped, "not subscribed, dropping queued messages");
            }
        }
        self.handler = Some(completion.handler);

        if completion.close {
            debug!("closing connection on client request");
            self.state = State::Closed;
        }
    }

    /// Writes a message, unless the connection has since unsubscribed from its channel.
    fn deliver(&mut self, delivery: Delivery) {
        let subscribed = match &self.handler {
            Some(RequestHandler::Subscriber(handler)) => handler.is_subscribed(&delivery.channel),
            _ => false,
        };
        if !subscribed {
            trace!(channel = ?delivery.channel, "not subscribed, dropping message");
            return;
        }

        trace!(channel = ?delivery.channel, "delivering message");
        Reply::Message {
            channel: delivery.channel,
            payload: delivery.payload,
        }
        .encode(&mut self.outbound);
    }

    async fn flush(&mut self) -> Result<(), Error> {
        self.outbound.flush(&mut self.writer).await?;
        Ok(())
    }

    /// Reading resumes once everything buffered has been written.
    fn writability_changed(&mut self) {
        if !self.auto_read && self.outbound.is_empty() {
            trace!("writable again, reading resumed");
            self.auto_read = true;
        }
    }

    async fn close(&mut self) {
        self.state = State::Closed;

        if let Err(err) = self.flush().await {
            debug!(%err, "failed to flush replies on close");
        }
        if let Err(err) = self.writer.shutdown().await {
            debug!(%err, "failed to shut down writer");
        }

        if let Some(handler) = self.handler.take() {
            handler.disconnect().await;
        }

        info!("connection closed");
    }
}
