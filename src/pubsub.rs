//! Pub/sub on top of store listeners.
//!
//! A channel is just a key: anything that creates or modifies key `ch` with a non-empty string
//! value is delivered to every connection subscribed to `ch`. Listeners never write to the
//! socket themselves, they push a [`Delivery`] into the owning connection's queue. The queue is
//! bounded: when a subscriber falls behind, new messages for it are dropped.

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tracing::{debug, trace, warn};

use crate::codec::Request;
use crate::commands::Command;
use crate::encoder::Reply;
use crate::handler::{Completion, Dispatch, Failure, RequestHandler, RespHandler};
use crate::store::{Event, EventKind, KeyFilter, Listener, ListenerId, Store, Value};

/// A message published on a channel this connection is subscribed to.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub channel: Bytes,
    pub payload: Bytes,
}

struct PubSubListener {
    channel: Bytes,
    sender: Sender<Delivery>,
}

impl Listener for PubSubListener {
    fn on_event(&self, event: &Event) {
        if !matches!(event.kind, EventKind::Created | EventKind::Modified) {
            return;
        }

        let Some(Value::Bytes(payload)) = event.value.as_deref() else {
            return;
        };
        if payload.is_empty() {
            return;
        }

        let delivery = Delivery {
            channel: self.channel.clone(),
            payload: payload.clone(),
        };
        match self.sender.try_send(delivery) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(channel = ?self.channel, "subscriber is falling behind, dropping message")
            }
            Err(TrySendError::Closed(_)) => {
                trace!(channel = ?self.channel, "subscriber is gone, dropping message")
            }
        }
    }
}

/// The listeners a connection registered, by channel.
///
/// Dropping a registry that still holds listeners deregisters them in the background, so a
/// connection that dies mid-request does not leak them.
struct ListenerRegistry {
    store: Arc<dyn Store>,
    listeners: BTreeMap<Bytes, ListenerId>,
}

impl ListenerRegistry {
    fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            listeners: BTreeMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.listeners.len()
    }

    fn channels(&self) -> Vec<Bytes> {
        self.listeners.keys().cloned().collect()
    }

    /// Hands every registration to the caller, leaving the registry empty.
    fn take(&mut self) -> (Arc<dyn Store>, BTreeMap<Bytes, ListenerId>) {
        (self.store.clone(), mem::take(&mut self.listeners))
    }
}

impl Drop for ListenerRegistry {
    fn drop(&mut self) {
        if self.listeners.is_empty() {
            return;
        }

        let (store, listeners) = self.take();
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(remove_all(store, listeners));
            }
            Err(_) => warn!(
                count = listeners.len(),
                "no runtime to deregister pub/sub listeners"
            ),
        }
    }
}

async fn remove_all(store: Arc<dyn Store>, listeners: BTreeMap<Bytes, ListenerId>) {
    for (channel, id) in listeners {
        match store.remove_listener(id).await {
            Ok(()) => debug!(?channel, %id, "removed pub/sub listener"),
            Err(err) => warn!(?channel, %id, %err, "failed to remove pub/sub listener"),
        }
    }
}

/// Handler for a connection with at least one subscription.
///
/// Only PING, SUBSCRIBE, UNSUBSCRIBE and QUIT are accepted. Once the last channel is
/// unsubscribed the connection goes back to a [`RespHandler`].
pub struct SubscriberHandler {
    resp: RespHandler,
    registry: ListenerRegistry,
}

impl SubscriberHandler {
    pub fn new(resp: RespHandler) -> Self {
        let registry = ListenerRegistry::new(resp.store());
        Self { resp, registry }
    }

    pub fn is_subscribed(&self, channel: &[u8]) -> bool {
        self.registry.listeners.contains_key(channel)
    }

    pub fn handle(self, request: Request) -> Dispatch {
        let command = match Command::try_from(request) {
            Ok(command) => command,
            Err(err) => return Dispatch::reply(self, Err(err.into())),
        };

        match command {
            Command::Subscribe(cmd) => self.subscribe(cmd.channels),
            Command::Unsubscribe(cmd) => self.unsubscribe(cmd.channels),
            Command::Ping(cmd) => Dispatch::reply(self, Ok(cmd.reply())),
            Command::Quit(_) => Dispatch::close(self, Reply::Ok),
            command => {
                let name: &'static str = (&command).into();
                Dispatch::reply(
                    self,
                    Err(Failure::Reply(format!(
                        "ERR Can't execute '{}': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context",
                        name
                    ))),
                )
            }
        }
    }

    /// Registers a listener for every channel not already subscribed, one at a time, and
    /// acknowledges each channel with the running subscription count.
    pub fn subscribe(mut self, channels: Vec<Bytes>) -> Dispatch {
        Dispatch::transition(async move {
            let mut acks = Vec::with_capacity(channels.len());

            for channel in channels {
                if !self.registry.listeners.contains_key(&channel) {
                    let listener = Arc::new(PubSubListener {
                        channel: channel.clone(),
                        sender: self.resp.deliveries(),
                    });
                    let filter = KeyFilter::exact(channel.clone());

                    match self.registry.store.add_listener(filter, listener).await {
                        Ok(id) => {
                            debug!(?channel, %id, "subscribed");
                            self.registry.listeners.insert(channel.clone(), id);
                        }
                        Err(err) => {
                            warn!(?channel, %err, "failed to register pub/sub listener");
                            acks.push(Reply::error(format!(
                                "ERR Failed to subscribe to channel: {}",
                                err
                            )));
                            return Ok(self.complete(acks));
                        }
                    }
                }

                acks.push(Reply::Subscribed {
                    channel,
                    count: self.registry.len(),
                });
            }

            Ok(self.complete(acks))
        })
    }

    /// Deregisters the listener of each channel, or of every channel when none are given. Each
    /// channel is acknowledged even when it was not subscribed.
    pub fn unsubscribe(mut self, channels: Vec<Bytes>) -> Dispatch {
        Dispatch::transition(async move {
            let channels = if channels.is_empty() {
                self.registry.channels()
            } else {
                channels
            };

            if channels.is_empty() {
                return Ok(self.complete(vec![Reply::Unsubscribed {
                    channel: None,
                    count: 0,
                }]));
            }

            let mut acks = Vec::with_capacity(channels.len());
            for channel in channels {
                if let Some(&id) = self.registry.listeners.get(&channel) {
                    if let Err(err) = self.registry.store.remove_listener(id).await {
                        warn!(?channel, %id, %err, "failed to remove pub/sub listener");
                        acks.push(Reply::error(format!(
                            "ERR Failed to unsubscribe from channel: {}",
                            err
                        )));
                        return Ok(self.complete(acks));
                    }
                    debug!(?channel, %id, "unsubscribed");
                    self.registry.listeners.remove(&channel);
                }

                acks.push(Reply::Unsubscribed {
                    channel: Some(channel),
                    count: self.registry.len(),
                });
            }

            Ok(self.complete(acks))
        })
    }

    pub fn disconnect(mut self) -> BoxFuture<'static, ()> {
        let (store, listeners) = self.registry.take();
        remove_all(store, listeners).boxed()
    }

    /// Stays in subscriber mode while any channel is left.
    fn complete(self, acks: Vec<Reply>) -> Completion {
        let reply = Reply::Many(acks);
        if self.registry.len() > 0 {
            return Completion::new(self, reply);
        }

        trace!("no subscriptions left, leaving subscriber mode");
        Completion::new(self.resp, reply)
    }
}
