use bytes::Bytes;
use std::sync::Arc;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};
use crate::store::{Applied, Output, Update, Value};

/// Posts a message to the given channel.
///
/// Channels live in the key space: the message is written as the value of key `channel`, and
/// every subscriber listening on that key receives it. Receivers are not counted, the reply is
/// always 0.
///
/// Ref: <https://redis.io/docs/latest/commands/publish/>
#[derive(Debug, PartialEq)]
pub struct Publish {
    pub channel: Bytes,
    pub message: Bytes,
}

impl Executable for Publish {
    fn exec(self, handler: RespHandler) -> Dispatch {
        let store = handler.store();
        let message = self.message;

        Dispatch::pending(handler, async move {
            store
                .apply(
                    self.channel,
                    Arc::new(move |_| {
                        Ok(Applied::new(
                            Update::Put(Value::Bytes(message.clone())),
                            Output::Unit,
                        ))
                    }),
                )
                .await?;

            Ok(Reply::Integer(0))
        })
    }
}

impl TryFrom<&mut CommandParser> for Publish {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let channel = parser.next_bytes()?;
        let message = parser.next_bytes()?;

        Ok(Self { channel, message })
    }
}
