use bytes::Bytes;
use std::sync::Arc;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};
use crate::store::{Applied, Output, Transform, Update};

/// Removes the specified keys. A key is ignored if it does not exist. Returns the number of keys
/// that were removed.
///
/// Ref: <https://redis.io/docs/latest/commands/del/>
#[derive(Debug, PartialEq)]
pub struct Del {
    pub keys: Vec<Bytes>,
}

fn remove() -> Transform {
    Arc::new(|current| match current {
        Some(_) => Ok(Applied::new(Update::Remove, Output::Flag(true))),
        None => Ok(Applied::read(Output::Flag(false))),
    })
}

impl Executable for Del {
    fn exec(self, handler: RespHandler) -> Dispatch {
        let store = handler.store();

        Dispatch::pending(handler, async move {
            let mut count = 0;
            for key in self.keys {
                if store.apply(key, remove()).await? == Output::Flag(true) {
                    count += 1;
                }
            }
            Ok(Reply::Integer(count))
        })
    }
}

impl TryFrom<&mut CommandParser> for Del {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.remaining();

        if keys.is_empty() {
            return Err(CommandParserError::EndOfStream);
        }

        Ok(Self { keys })
    }
}
