use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::handler::{Dispatch, RespHandler};
use crate::pubsub::SubscriberHandler;

/// Subscribes the client to the specified channels. Once subscribed the connection only accepts
/// subscriber commands until every channel is unsubscribed.
///
/// Ref: <https://redis.io/docs/latest/commands/subscribe/>
#[derive(Debug, PartialEq)]
pub struct Subscribe {
    pub channels: Vec<Bytes>,
}

impl Executable for Subscribe {
    fn exec(self, handler: RespHandler) -> Dispatch {
        SubscriberHandler::new(handler).subscribe(self.channels)
    }
}

impl TryFrom<&mut CommandParser> for Subscribe {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let channels = parser.remaining();

        if channels.is_empty() {
            return Err(CommandParserError::EndOfStream);
        }

        Ok(Self { channels })
    }
}
