use bytes::Bytes;
use std::sync::Arc;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};
use crate::store::{Applied, Output, Update, Value};

/// Set `key` to hold the string `value`. If `key` already holds a value, it is overwritten,
/// regardless of its type.
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: Bytes,
    pub value: Bytes,
}

impl Executable for Set {
    fn exec(self, handler: RespHandler) -> Dispatch {
        let store = handler.store();
        let value = self.value;

        Dispatch::pending(handler, async move {
            store
                .apply(
                    self.key,
                    Arc::new(move |_| {
                        Ok(Applied::new(
                            Update::Put(Value::Bytes(value.clone())),
                            Output::Unit,
                        ))
                    }),
                )
                .await?;

            Ok(Reply::Ok)
        })
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let value = parser.next_bytes()?;

        Ok(Self { key, value })
    }
}
