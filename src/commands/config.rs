use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::encoder::Reply;
use crate::handler::{Dispatch, Failure, RespHandler};

/// Just enough of CONFIG GET/SET for clients that read the server configuration on connect.
/// `appendonly` reads as `no`, every other parameter as empty, and SET is acknowledged without
/// effect.
///
/// Ref: <https://redis.io/docs/latest/commands/config/>
#[derive(Debug, PartialEq)]
pub struct Config {
    pub subcommand: String,
    pub parameter: String,
}

impl Config {
    fn reply(&self) -> Result<Reply, Failure> {
        match self.subcommand.to_uppercase().as_str() {
            "GET" => {
                if self.parameter.contains(['*', '?']) {
                    return Err(Failure::Reply(
                        "ERR CONFIG blob pattern matching not implemented".to_string(),
                    ));
                }

                let value = if self.parameter.eq_ignore_ascii_case("appendonly") {
                    "no"
                } else {
                    ""
                };

                Ok(Reply::Array(vec![
                    Reply::Simple(self.parameter.clone()),
                    Reply::Simple(value.to_string()),
                ]))
            }
            "SET" => Ok(Reply::Ok),
            _ => Err(Failure::Reply(format!(
                "ERR CONFIG {} not implemented",
                self.subcommand
            ))),
        }
    }
}

impl Executable for Config {
    fn exec(self, handler: RespHandler) -> Dispatch {
        let reply = self.reply();
        Dispatch::reply(handler, reply)
    }
}

impl TryFrom<&mut CommandParser> for Config {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?;
        let parameter = parser.next_string()?;
        // Values of CONFIG SET are ignored.
        parser.remaining();

        Ok(Self {
            subcommand,
            parameter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::testing::execute;
    use crate::store::MemoryStore;

    fn pair(name: &str, value: &str) -> Reply {
        Reply::Array(vec![
            Reply::Simple(name.to_string()),
            Reply::Simple(value.to_string()),
        ])
    }

    #[tokio::test]
    async fn get() {
        let store = MemoryStore::new();

        assert_eq!(
            execute(&store, &["CONFIG", "GET", "appendonly"]).await,
            pair("appendonly", "no")
        );
        assert_eq!(
            execute(&store, &["config", "get", "save"]).await,
            pair("save", "")
        );
        assert_eq!(
            execute(&store, &["CONFIG", "GET", "max*"]).await,
            Reply::error("ERR CONFIG blob pattern matching not implemented")
        );
    }

    #[tokio::test]
    async fn set() {
        let store = MemoryStore::new();

        assert_eq!(
            execute(&store, &["CONFIG", "SET", "appendonly", "yes"]).await,
            Reply::Ok
        );
    }

    #[tokio::test]
    async fn other_subcommands() {
        let store = MemoryStore::new();

        assert_eq!(
            execute(&store, &["CONFIG", "RESETSTAT", "x"]).await,
            Reply::error("ERR CONFIG RESETSTAT not implemented")
        );
    }
}
