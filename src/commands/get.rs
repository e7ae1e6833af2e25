use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, Failure, RespHandler};
use crate::list::ListError;
use crate::store::Value;

/// Get the value of `key`. If the key does not exist the special value `nil` is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/get/>
#[derive(Debug, PartialEq)]
pub struct Get {
    pub key: Bytes,
}

impl Executable for Get {
    fn exec(self, handler: RespHandler) -> Dispatch {
        let store = handler.store();

        Dispatch::pending(handler, async move {
            match store.get(&self.key).await?.as_deref() {
                Some(Value::Bytes(value)) => Ok(Reply::Bulk(value.clone())),
                Some(_) => Err(Failure::from(ListError::WrongType)),
                None => Ok(Reply::Null),
            }
        })
    }
}

impl TryFrom<&mut CommandParser> for Get {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
