use crate::commands::executable::Executable;
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};

/// Ask the server to close the connection. The connection is closed as soon as all pending
/// replies have been written to the client.
///
/// Ref: <https://redis.io/docs/latest/commands/quit/>
#[derive(Debug, PartialEq)]
pub struct Quit;

impl Executable for Quit {
    fn exec(self, handler: RespHandler) -> Dispatch {
        Dispatch::close(handler, Reply::Ok)
    }
}
