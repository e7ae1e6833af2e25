use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};

/// Returns the length of the list stored at `key`. If `key` does not exist, it is interpreted as
/// an empty list and 0 is returned.
///
/// Ref: <https://redis.io/docs/latest/commands/llen/>
#[derive(Debug, PartialEq)]
pub struct Llen {
    pub key: Bytes,
}

impl Executable for Llen {
    fn exec(self, handler: RespHandler) -> Dispatch {
        let lists = handler.lists();

        Dispatch::pending(handler, async move {
            let size = lists.size(&self.key).await?;
            Ok(Reply::Integer(size as i64))
        })
    }
}

impl TryFrom<&mut CommandParser> for Llen {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        Ok(Self { key })
    }
}
