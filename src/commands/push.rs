use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};

/// Insert all the specified values at the head (LPUSH) or the tail (RPUSH) of the list stored at
/// `key`, one after the other, creating the list if needed. The whole push is one atomic update.
/// Returns the length of the list after the push.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
/// Ref: <https://redis.io/docs/latest/commands/rpush/>
#[derive(Debug, PartialEq)]
pub struct Push {
    pub key: Bytes,
    pub values: Vec<Bytes>,
    pub head: bool,
}

impl Push {
    pub fn parse(parser: &mut CommandParser, head: bool) -> Result<Self, CommandParserError> {
        let key = parser.next_bytes()?;
        let values = parser.remaining();

        if values.is_empty() {
            return Err(CommandParserError::EndOfStream);
        }

        Ok(Self { key, values, head })
    }
}

impl Executable for Push {
    fn exec(self, handler: RespHandler) -> Dispatch {
        let lists = handler.lists();

        Dispatch::pending(handler, async move {
            let size = if self.head {
                lists.offer_first(self.key, self.values).await?
            } else {
                lists.offer_last(self.key, self.values).await?
            };

            Ok(Reply::Integer(size as i64))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Request;
    use crate::commands::Command;
    use crate::handler::testing::execute;
    use crate::store::MemoryStore;

    #[test]
    fn parse() {
        let request = Request::new("LPUSH", vec![Bytes::from("k"), Bytes::from("a")]);

        assert_eq!(
            Command::try_from(request).unwrap(),
            Command::Lpush(Push {
                key: Bytes::from("k"),
                values: vec![Bytes::from("a")],
                head: true,
            })
        );
    }

    #[tokio::test]
    async fn lpush_reverses_arguments() {
        let store = MemoryStore::new();

        assert_eq!(
            execute(&store, &["LPUSH", "k", "a", "b", "c"]).await,
            Reply::Integer(3)
        );
        assert_eq!(
            execute(&store, &["LRANGE", "k", "0", "-1"]).await,
            Reply::bulks(vec![Bytes::from("c"), Bytes::from("b"), Bytes::from("a")])
        );
    }

    #[tokio::test]
    async fn rpush_keeps_argument_order() {
        let store = MemoryStore::new();

        execute(&store, &["RPUSH", "k", "a", "b"]).await;

        assert_eq!(execute(&store, &["RPUSH", "k", "c"]).await, Reply::Integer(3));
        assert_eq!(
            execute(&store, &["LRANGE", "k", "0", "-1"]).await,
            Reply::bulks(vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")])
        );
    }

    #[tokio::test]
    async fn string_key() {
        let store = MemoryStore::new();

        execute(&store, &["SET", "k", "v"]).await;

        assert_eq!(
            execute(&store, &["RPUSH", "k", "a"]).await,
            Reply::error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }
}
