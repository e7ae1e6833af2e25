use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};

/// Returns the elements of the list stored at `key` between `start` and `stop`, both inclusive.
/// Negative offsets count from the tail. A missing key replies an empty array.
///
/// Ref: <https://redis.io/docs/latest/commands/lrange/>
#[derive(Debug, PartialEq)]
pub struct Lrange {
    pub key: Bytes,
    pub start: i64,
    pub stop: i64,
}

impl Executable for Lrange {
    fn exec(self, handler: RespHandler) -> Dispatch {
        let lists = handler.lists();

        Dispatch::pending(handler, async move {
            let elements = lists.sublist(self.key, self.start, self.stop).await?;
            Ok(Reply::bulks(elements.unwrap_or_default()))
        })
    }
}

impl TryFrom<&mut CommandParser> for Lrange {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let start = parser.next_integer()?;
        let stop = parser.next_integer()?;

        Ok(Self { key, start, stop })
    }
}
