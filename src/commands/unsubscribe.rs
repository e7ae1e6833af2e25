use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::handler::{Dispatch, RespHandler};
use crate::pubsub::SubscriberHandler;

/// Unsubscribes the client from the given channels, or from all of them when none is given.
///
/// Ref: <https://redis.io/docs/latest/commands/unsubscribe/>
#[derive(Debug, PartialEq)]
pub struct Unsubscribe {
    pub channels: Vec<Bytes>,
}

impl Executable for Unsubscribe {
    fn exec(self, handler: RespHandler) -> Dispatch {
        // Not subscribed to anything: every channel is acknowledged with a count of 0.
        SubscriberHandler::new(handler).unsubscribe(self.channels)
    }
}

impl TryFrom<&mut CommandParser> for Unsubscribe {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self {
            channels: parser.remaining(),
        })
    }
}
