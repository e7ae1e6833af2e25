//! Request handlers and the results they hand back to the connection.

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error as ThisError;
use tokio::sync::mpsc::Sender;
use tracing::trace;

use crate::codec::Request;
use crate::commands::executable::Executable;
use crate::commands::{Command, CommandParserError};
use crate::encoder::Reply;
use crate::list::{ListError, ListMultimap};
use crate::pubsub::{Delivery, SubscriberHandler};
use crate::store::{Store, StoreError};
use crate::Error;

/// Why a command did not produce its normal reply.
#[derive(Debug, ThisError)]
pub enum Failure {
    /// Answered with an error reply. The connection stays open.
    #[error("{0}")]
    Reply(String),
    /// The connection is answered with a server error and closed.
    #[error("{0}")]
    Fatal(Error),
}

impl From<CommandParserError> for Failure {
    fn from(err: CommandParserError) -> Self {
        Failure::Reply(err.to_string())
    }
}

impl From<StoreError> for Failure {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::WrongType { .. } => Failure::Reply(ListError::WrongType.to_string()),
            StoreError::InvalidValue(msg) => Failure::Reply(format!("ERR {}", msg)),
            err @ StoreError::Unavailable(_) => Failure::Fatal(err.into()),
        }
    }
}

impl From<ListError> for Failure {
    fn from(err: ListError) -> Self {
        match err {
            ListError::Store(err) => err.into(),
            err => Failure::Reply(err.to_string()),
        }
    }
}

/// What a request left behind: the handler for the next request and the reply to write.
pub struct Completion {
    pub handler: RequestHandler,
    pub reply: Reply,
    /// Close the connection once the reply is flushed.
    pub close: bool,
}

impl Completion {
    pub fn new(handler: impl Into<RequestHandler>, reply: Reply) -> Self {
        Self {
            handler: handler.into(),
            reply,
            close: false,
        }
    }

    fn from_result(handler: RequestHandler, result: Result<Reply, Failure>) -> Result<Self, Error> {
        match result {
            Ok(reply) => Ok(Self::new(handler, reply)),
            Err(Failure::Reply(message)) => Ok(Self::new(handler, Reply::Error(message))),
            Err(Failure::Fatal(err)) => Err(err),
        }
    }
}

/// The outcome of handing a request to a handler: either already known, or a future the
/// connection has to wait for.
pub enum Dispatch {
    Ready(Result<Completion, Error>),
    Pending(BoxFuture<'static, Result<Completion, Error>>),
}

impl Dispatch {
    pub fn reply(handler: impl Into<RequestHandler>, result: Result<Reply, Failure>) -> Self {
        Dispatch::Ready(Completion::from_result(handler.into(), result))
    }

    /// Replies once `future` resolves, keeping `handler` for the next request.
    pub fn pending<F>(handler: impl Into<RequestHandler>, future: F) -> Self
    where
        F: Future<Output = Result<Reply, Failure>> + Send + 'static,
    {
        let handler = handler.into();
        Dispatch::Pending(
            async move { Completion::from_result(handler, future.await) }.boxed(),
        )
    }

    /// A future that decides the next handler itself.
    pub fn transition<F>(future: F) -> Self
    where
        F: Future<Output = Result<Completion, Error>> + Send + 'static,
    {
        Dispatch::Pending(future.boxed())
    }

    /// Replies and then closes the connection.
    pub fn close(handler: impl Into<RequestHandler>, reply: Reply) -> Self {
        Dispatch::Ready(Ok(Completion {
            handler: handler.into(),
            reply,
            close: true,
        }))
    }
}

/// The default handler: runs every command against the store.
#[derive(Clone)]
pub struct RespHandler {
    store: Arc<dyn Store>,
    deliveries: Sender<Delivery>,
}

impl RespHandler {
    pub fn new(store: Arc<dyn Store>, deliveries: Sender<Delivery>) -> Self {
        Self { store, deliveries }
    }

    pub fn store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    pub fn lists(&self) -> ListMultimap {
        ListMultimap::new(self.store.clone())
    }

    /// Where pub/sub listeners registered by this connection push their messages.
    pub fn deliveries(&self) -> Sender<Delivery> {
        self.deliveries.clone()
    }

    pub fn handle(self, request: Request) -> Dispatch {
        match Command::try_from(request) {
            Ok(command) => {
                trace!(?command, "executing command");
                command.exec(self)
            }
            Err(err) => Dispatch::reply(self, Err(err.into())),
        }
    }
}

/// The handler a connection is currently in. Each request may replace it.
pub enum RequestHandler {
    Resp(RespHandler),
    Subscriber(SubscriberHandler),
}

impl RequestHandler {
    pub fn handle(self, request: Request) -> Dispatch {
        match self {
            RequestHandler::Resp(handler) => handler.handle(request),
            RequestHandler::Subscriber(handler) => handler.handle(request),
        }
    }

    /// Releases everything the handler registered on behalf of the connection. Failures are only
    /// logged.
    pub fn disconnect(self) -> BoxFuture<'static, ()> {
        match self {
            RequestHandler::Resp(_) => futures::future::ready(()).boxed(),
            RequestHandler::Subscriber(handler) => handler.disconnect(),
        }
    }

    pub fn is_subscriber(&self) -> bool {
        matches!(self, RequestHandler::Subscriber(_))
    }
}

impl From<RespHandler> for RequestHandler {
    fn from(handler: RespHandler) -> Self {
        RequestHandler::Resp(handler)
    }
}

impl From<SubscriberHandler> for RequestHandler {
    fn from(handler: SubscriberHandler) -> Self {
        RequestHandler::Subscriber(handler)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn store_errors() {
        assert!(matches!(
            Failure::from(StoreError::WrongType { actual: "list" }),
            Failure::Reply(msg) if msg.starts_with("WRONGTYPE")
        ));
        assert!(matches!(
            Failure::from(StoreError::InvalidValue("value is not a valid float")),
            Failure::Reply(msg) if msg == "ERR value is not a valid float"
        ));
        assert!(matches!(
            Failure::from(StoreError::Unavailable("down".into())),
            Failure::Fatal(_)
        ));
    }

    #[test]
    fn list_errors() {
        assert!(matches!(
            Failure::from(ListError::Argument("value is out of range, must be positive")),
            Failure::Reply(msg) if msg == "ERR value is out of range, must be positive"
        ));
        assert!(matches!(
            Failure::from(ListError::Store(StoreError::Unavailable("down".into()))),
            Failure::Fatal(_)
        ));
    }

    #[tokio::test]
    async fn parse_errors_keep_the_handler() {
        let (handler, _deliveries) = resp_handler(Arc::new(MemoryStore::new()));

        let completion = complete(handler.handle(request(&["NOPE"]))).await.unwrap();

        assert_eq!(
            completion.reply,
            Reply::error("ERR unknown command 'NOPE', with args beginning with: ")
        );
        assert!(!completion.close);
        assert!(!completion.handler.is_subscriber());
    }

    #[tokio::test]
    async fn fatal_failures_become_errors() {
        let dispatch = Dispatch::pending(
            resp_handler(Arc::new(MemoryStore::new())).0,
            async { Err(Failure::Fatal("boom".into())) },
        );

        let err = complete(dispatch).await.err().unwrap();

        assert_eq!(err.to_string(), "boom");
    }
}
