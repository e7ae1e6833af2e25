use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};

/// Removes and returns the first (LPOP) or last (RPOP) elements of the list stored at `key`.
///
/// Without `count` the reply is a single element, or nil when the key does not exist. With
/// `count` it is an array of up to `count` elements in pop order, or a nil array when the key
/// does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/lpop/>
/// Ref: <https://redis.io/docs/latest/commands/rpop/>
#[derive(Debug, PartialEq)]
pub struct Pop {
    pub key: Bytes,
    pub count: Option<i64>,
    pub head: bool,
}

impl Pop {
    pub fn parse(parser: &mut CommandParser, head: bool) -> Result<Self, CommandParserError> {
        let key = parser.next_bytes()?;
        let count = match parser.next_integer() {
            Ok(count) => Some(count),
            Err(CommandParserError::EndOfStream) => None,
            Err(err) => return Err(err),
        };

        Ok(Self { key, count, head })
    }
}

impl Executable for Pop {
    fn exec(self, handler: RespHandler) -> Dispatch {
        let lists = handler.lists();

        Dispatch::pending(handler, async move {
            let polled = if self.head {
                lists.poll_first(self.key, self.count.unwrap_or(1)).await?
            } else {
                // Polled elements come back head to tail, RPOP replies tail first.
                lists
                    .poll_last(self.key, self.count.unwrap_or(1))
                    .await?
                    .map(|mut elements| {
                        elements.reverse();
                        elements
                    })
            };

            let reply = match (self.count, polled) {
                (None, polled) => Reply::optional(polled.and_then(|e| e.into_iter().next())),
                (Some(_), Some(elements)) => Reply::bulks(elements),
                (Some(_), None) => Reply::NullArray,
            };

            Ok(reply)
        })
    }
}
