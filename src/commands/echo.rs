use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};

/// Returns `message`.
///
/// Ref: <https://redis.io/docs/latest/commands/echo/>
#[derive(Debug, PartialEq)]
pub struct Echo {
    pub message: Bytes,
}

impl Executable for Echo {
    fn exec(self, handler: RespHandler) -> Dispatch {
        Dispatch::reply(handler, Ok(Reply::Bulk(self.message)))
    }
}

impl TryFrom<&mut CommandParser> for Echo {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let message = parser.next_bytes()?;
        Ok(Self { message })
    }
}

#[cfg(test)]
mod tests {
    use crate::encoder::Reply;
    use crate::handler::testing::execute;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn echo() {
        let store = MemoryStore::new();

        assert_eq!(execute(&store, &["ECHO", "hey"]).await, Reply::bulk("hey"));
        assert_eq!(execute(&store, &["ECHO", ""]).await, Reply::bulk(""));
    }
}
