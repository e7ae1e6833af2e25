use bytes::Bytes;
use std::str;
use std::sync::Arc;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, Failure, RespHandler};
use crate::store::{Applied, Output, StoreError, Transform, Update, Value};

/// Increment the string representing a floating point number stored at key by the specified
/// increment. By using a negative increment value, the result is that the value stored at the key
/// is decremented (by the obvious properties of addition). If the key does not exist, it is set to
/// 0 before performing the operation.
///
/// Ref: <https://redis.io/docs/latest/commands/incrbyfloat/>
#[derive(Debug, PartialEq)]
pub struct IncrByFloat {
    pub key: Bytes,
    pub increment: f64,
}

fn increment(by: f64) -> Transform {
    Arc::new(move |current| {
        let value = match current {
            None => 0.0,
            Some(Value::Bytes(bytes)) => str::from_utf8(bytes)
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or(StoreError::InvalidValue("value is not a valid float"))?,
            Some(other) => {
                return Err(StoreError::WrongType {
                    actual: other.type_name(),
                })
            }
        };

        let result = value + by;
        if !result.is_finite() {
            return Err(StoreError::InvalidValue(
                "increment would produce NaN or Infinity",
            ));
        }

        Ok(Applied::new(
            Update::Put(Value::Bytes(Bytes::from(result.to_string()))),
            Output::Float(result),
        ))
    })
}

impl Executable for IncrByFloat {
    fn exec(self, handler: RespHandler) -> Dispatch {
        let store = handler.store();

        Dispatch::pending(handler, async move {
            match store.apply(self.key, increment(self.increment)).await? {
                Output::Float(result) => Ok(Reply::Double(result)),
                output => Err(Failure::Fatal(
                    format!("unexpected transform output {:?}", output).into(),
                )),
            }
        })
    }
}

impl TryFrom<&mut CommandParser> for IncrByFloat {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let increment = parser.next_float()?;

        Ok(Self { key, increment })
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
        let request = Request::new("INCRBYFLOAT", vec![Bytes::from("key1"), Bytes::from("0.1")]);

        assert_eq!(
            Command::try_from(request).unwrap(),
            Command::IncrByFloat(IncrByFloat {
                key: Bytes::from("key1"),
                increment: 0.1,
            })
        );
    }

    #[tokio::test]
    async fn existing_key() {
        let store = MemoryStore::new();

        execute(&store, &["SET", "key1", "10.50"]).await;

        assert_eq!(
            execute(&store, &["INCRBYFLOAT", "key1", "0.1"]).await,
            Reply::Double(10.6)
        );
        assert_eq!(execute(&store, &["GET", "key1"]).await, Reply::bulk("10.6"));
    }

    #[tokio::test]
    async fn non_existing_key() {
        let store = MemoryStore::new();

        assert_eq!(
            execute(&store, &["INCRBYFLOAT", "key1", "10"]).await,
            Reply::Double(10.0)
        );
        assert_eq!(execute(&store, &["GET", "key1"]).await, Reply::bulk("10"));
    }

    #[tokio::test]
    async fn invalid_value() {
        let store = MemoryStore::new();

        execute(&store, &["SET", "key1", "value"]).await;

        assert_eq!(
            execute(&store, &["INCRBYFLOAT", "key1", "10"]).await,
            Reply::error("ERR value is not a valid float")
        );
        assert_eq!(execute(&store, &["GET", "key1"]).await, Reply::bulk("value"));
    }

    #[tokio::test]
    async fn invalid_increment() {
        let store = MemoryStore::new();

        assert_eq!(
            execute(&store, &["INCRBYFLOAT", "key1", "abc"]).await,
            Reply::error("ERR value is not a valid float")
        );
        assert_eq!(
            execute(&store, &["INCRBYFLOAT", "key1", "inf"]).await,
            Reply::error("ERR increment would produce NaN or Infinity")
        );
    }

    #[tokio::test]
    async fn list_key() {
        let store = MemoryStore::new();

        execute(&store, &["LPUSH", "key1", "1"]).await;

        assert_eq!(
            execute(&store, &["INCRBYFLOAT", "key1", "1"]).await,
            Reply::error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }
}
