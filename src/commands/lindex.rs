use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};

/// Returns the element at `index` in the list stored at `key`. Negative indices count from the
/// tail, -1 being the last element. Out of range indices and missing keys reply nil.
///
/// Ref: <https://redis.io/docs/latest/commands/lindex/>
#[derive(Debug, PartialEq)]
pub struct Lindex {
    pub key: Bytes,
    pub index: i64,
}

impl Executable for Lindex {
    fn exec(self, handler: RespHandler) -> Dispatch {
        let lists = handler.lists();

        Dispatch::pending(handler, async move {
            let element = lists.index(self.key, self.index).await?;
            Ok(Reply::optional(element))
        })
    }
}

impl TryFrom<&mut CommandParser> for Lindex {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let index = parser.next_integer()?;

        Ok(Self { key, index })
    }
}
