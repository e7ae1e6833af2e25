use crate::commands::executable::Executable;
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};

/// Disables read queries on a replica.
///
/// Ref: <https://redis.io/docs/latest/commands/readwrite/>
#[derive(Debug, PartialEq)]
pub struct ReadWrite;

impl Executable for ReadWrite {
    fn exec(self, handler: RespHandler) -> Dispatch {
        Dispatch::reply(handler, Ok(Reply::Ok))
    }
}
