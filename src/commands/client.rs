use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, RespHandler};

/// Client connection subcommands (SETNAME, SETINFO, ...). Clients send these while setting up a
/// connection, they are acknowledged and otherwise ignored.
///
/// Ref: <https://redis.io/docs/latest/commands/client/>
#[derive(Debug, PartialEq)]
pub struct Client {
    pub subcommand: Bytes,
}

impl Executable for Client {
    fn exec(self, handler: RespHandler) -> Dispatch {
        Dispatch::reply(handler, Ok(Reply::Ok))
    }
}

impl TryFrom<&mut CommandParser> for Client {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_bytes()?;
        // The subcommand arguments are not used.
        parser.remaining();

        Ok(Self { subcommand })
    }
}
