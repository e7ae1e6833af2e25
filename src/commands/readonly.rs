use crate::commands::executable::Executable;
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};

/// Enables read queries on a replica. Every node serves reads here, so this only acknowledges.
///
/// Ref: <https://redis.io/docs/latest/commands/readonly/>
#[derive(Debug, PartialEq)]
pub struct ReadOnly;

impl Executable for ReadOnly {
    fn exec(self, handler: RespHandler) -> Dispatch {
        Dispatch::reply(handler, Ok(Reply::Ok))
    }
}
