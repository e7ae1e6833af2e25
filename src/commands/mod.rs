pub mod client;
pub mod config;
pub mod del;
pub mod echo;
pub mod executable;
pub mod get;
pub mod incrbyfloat;
pub mod lcs;
pub mod lindex;
pub mod llen;
pub mod lrange;
pub mod ping;
pub mod pop;
pub mod publish;
pub mod push;
pub mod quit;
pub mod readonly;
pub mod readwrite;
pub mod set;
pub mod subscribe;
pub mod unsubscribe;

use bytes::Bytes;
use itertools::Itertools;
use std::{str, vec};
use strum_macros::IntoStaticStr;
use thiserror::Error as ThisError;

use crate::codec::Request;
use crate::commands::executable::Executable;
use crate::handler::{Dispatch, RespHandler};

use client::Client;
use config::Config;
use del::Del;
use echo::Echo;
use get::Get;
use incrbyfloat::IncrByFloat;
use lcs::Lcs;
use lindex::Lindex;
use llen::Llen;
use lrange::Lrange;
use ping::Ping;
use pop::Pop;
use publish::Publish;
use push::Push;
use quit::Quit;
use readonly::ReadOnly;
use readwrite::ReadWrite;
use set::Set;
use subscribe::Subscribe;
use unsubscribe::Unsubscribe;

#[derive(Debug, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    Del(Del),
    Get(Get),
    IncrByFloat(IncrByFloat),
    Lcs(Lcs),
    Set(Set),

    Lindex(Lindex),
    Llen(Llen),
    Lpop(Pop),
    Lpush(Push),
    Lrange(Lrange),
    Rpop(Pop),
    Rpush(Push),

    Publish(Publish),
    Subscribe(Subscribe),
    Unsubscribe(Unsubscribe),

    Client(Client),
    Config(Config),
    Echo(Echo),
    Ping(Ping),
    Quit(Quit),
    ReadOnly(ReadOnly),
    ReadWrite(ReadWrite),
}

impl Executable for Command {
    fn exec(self, handler: RespHandler) -> Dispatch {
        match self {
            Command::Client(cmd) => cmd.exec(handler),
            Command::Config(cmd) => cmd.exec(handler),
            Command::Del(cmd) => cmd.exec(handler),
            Command::Echo(cmd) => cmd.exec(handler),
            Command::Get(cmd) => cmd.exec(handler),
            Command::IncrByFloat(cmd) => cmd.exec(handler),
            Command::Lcs(cmd) => cmd.exec(handler),
            Command::Lindex(cmd) => cmd.exec(handler),
            Command::Llen(cmd) => cmd.exec(handler),
            Command::Lpop(cmd) => cmd.exec(handler),
            Command::Lpush(cmd) => cmd.exec(handler),
            Command::Lrange(cmd) => cmd.exec(handler),
            Command::Ping(cmd) => cmd.exec(handler),
            Command::Publish(cmd) => cmd.exec(handler),
            Command::Quit(cmd) => cmd.exec(handler),
            Command::ReadOnly(cmd) => cmd.exec(handler),
            Command::ReadWrite(cmd) => cmd.exec(handler),
            Command::Rpop(cmd) => cmd.exec(handler),
            Command::Rpush(cmd) => cmd.exec(handler),
            Command::Set(cmd) => cmd.exec(handler),
            Command::Subscribe(cmd) => cmd.exec(handler),
            Command::Unsubscribe(cmd) => cmd.exec(handler),
        }
    }
}

/// How many arguments a command takes, not counting the command name itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(self, args: usize) -> bool {
        match self {
            Arity::Exact(n) => args == n,
            Arity::AtLeast(n) => args >= n,
            Arity::Range(min, max) => (min..=max).contains(&args),
        }
    }
}

/// An entry of the command table.
pub struct CommandSpec {
    pub name: &'static str,
    pub arity: Arity,
    parse: fn(&mut CommandParser) -> Result<Command, CommandParserError>,
}

static COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "client",
        arity: Arity::AtLeast(1),
        parse: |parser| Client::try_from(parser).map(Command::Client),
    },
    CommandSpec {
        name: "config",
        arity: Arity::AtLeast(2),
        parse: |parser| Config::try_from(parser).map(Command::Config),
    },
    CommandSpec {
        name: "del",
        arity: Arity::AtLeast(1),
        parse: |parser| Del::try_from(parser).map(Command::Del),
    },
    CommandSpec {
        name: "echo",
        arity: Arity::Exact(1),
        parse: |parser| Echo::try_from(parser).map(Command::Echo),
    },
    CommandSpec {
        name: "get",
        arity: Arity::Exact(1),
        parse: |parser| Get::try_from(parser).map(Command::Get),
    },
    CommandSpec {
        name: "incrbyfloat",
        arity: Arity::Exact(2),
        parse: |parser| IncrByFloat::try_from(parser).map(Command::IncrByFloat),
    },
    CommandSpec {
        name: "lcs",
        arity: Arity::AtLeast(2),
        parse: |parser| Lcs::try_from(parser).map(Command::Lcs),
    },
    CommandSpec {
        name: "lindex",
        arity: Arity::Exact(2),
        parse: |parser| Lindex::try_from(parser).map(Command::Lindex),
    },
    CommandSpec {
        name: "llen",
        arity: Arity::Exact(1),
        parse: |parser| Llen::try_from(parser).map(Command::Llen),
    },
    CommandSpec {
        name: "lpop",
        arity: Arity::Range(1, 2),
        parse: |parser| Pop::parse(parser, true).map(Command::Lpop),
    },
    CommandSpec {
        name: "lpush",
        arity: Arity::AtLeast(2),
        parse: |parser| Push::parse(parser, true).map(Command::Lpush),
    },
    CommandSpec {
        name: "lrange",
        arity: Arity::Exact(3),
        parse: |parser| Lrange::try_from(parser).map(Command::Lrange),
    },
    CommandSpec {
        name: "ping",
        arity: Arity::Range(0, 1),
        parse: |parser| Ping::try_from(parser).map(Command::Ping),
    },
    CommandSpec {
        name: "publish",
        arity: Arity::Exact(2),
        parse: |parser| Publish::try_from(parser).map(Command::Publish),
    },
    CommandSpec {
        name: "quit",
        arity: Arity::Exact(0),
        parse: |_| Ok(Command::Quit(Quit)),
    },
    CommandSpec {
        name: "readonly",
        arity: Arity::Exact(0),
        parse: |_| Ok(Command::ReadOnly(ReadOnly)),
    },
    CommandSpec {
        name: "readwrite",
        arity: Arity::Exact(0),
        parse: |_| Ok(Command::ReadWrite(ReadWrite)),
    },
    CommandSpec {
        name: "rpop",
        arity: Arity::Range(1, 2),
        parse: |parser| Pop::parse(parser, false).map(Command::Rpop),
    },
    CommandSpec {
        name: "rpush",
        arity: Arity::AtLeast(2),
        parse: |parser| Push::parse(parser, false).map(Command::Rpush),
    },
    CommandSpec {
        name: "set",
        arity: Arity::Exact(2),
        parse: |parser| Set::try_from(parser).map(Command::Set),
    },
    CommandSpec {
        name: "subscribe",
        arity: Arity::AtLeast(1),
        parse: |parser| Subscribe::try_from(parser).map(Command::Subscribe),
    },
    CommandSpec {
        name: "unsubscribe",
        arity: Arity::AtLeast(0),
        parse: |parser| Unsubscribe::try_from(parser).map(Command::Unsubscribe),
    },
];

/// Looks a command up by name, ignoring ASCII case.
pub fn lookup(name: &[u8]) -> Option<&'static CommandSpec> {
    COMMANDS
        .iter()
        .find(|spec| spec.name.as_bytes().eq_ignore_ascii_case(name))
}

impl TryFrom<Request> for Command {
    type Error = CommandParserError;

    fn try_from(request: Request) -> Result<Self, Self::Error> {
        let Some(spec) = lookup(&request.name) else {
            return Err(CommandParserError::UnknownCommand {
                command: String::from_utf8_lossy(&request.name).into_owned(),
                args: request
                    .args
                    .iter()
                    .map(|arg| format!("'{}'", String::from_utf8_lossy(arg)))
                    .join(" "),
            });
        };

        if !spec.arity.accepts(request.args.len()) {
            return Err(CommandParserError::WrongArity { command: spec.name });
        }

        let parser = &mut CommandParser::new(request.args);
        (spec.parse)(parser)
    }
}

pub struct CommandParser {
    parts: vec::IntoIter<Bytes>,
}

impl CommandParser {
    pub fn new(args: Vec<Bytes>) -> Self {
        Self {
            parts: args.into_iter(),
        }
    }

    pub fn has_remaining(&self) -> bool {
        self.parts.len() > 0
    }

    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        self.parts.next().ok_or(CommandParserError::EndOfStream)
    }

    /// Subcommands and options are matched as text.
    fn next_string(&mut self) -> Result<String, CommandParserError> {
        let bytes = self.next_bytes()?;
        str::from_utf8(&bytes)
            .map(|s| s.to_string())
            .map_err(|_| CommandParserError::Syntax)
    }

    fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        let bytes = self.next_bytes()?;
        str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or(CommandParserError::NotAnInteger)
    }

    fn next_float(&mut self) -> Result<f64, CommandParserError> {
        let bytes = self.next_bytes()?;
        str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|f| !f.is_nan())
            .ok_or(CommandParserError::NotAFloat)
    }

    fn remaining(&mut self) -> Vec<Bytes> {
        self.parts.by_ref().collect()
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("ERR unknown command '{command}', with args beginning with: {args}")]
    UnknownCommand { command: String, args: String },
    #[error("ERR wrong number of arguments for '{command}' command")]
    WrongArity { command: &'static str },
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR value is not a valid float")]
    NotAFloat,
    #[error("ERR syntax error")]
    Syntax,
    #[error("ERR {0}")]
    Invalid(String),
    #[error("ERR protocol error; attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(parts: &[&'static str]) -> Request {
        Request::new(
            parts[0],
            parts[1..].iter().map(|part| Bytes::from(*part)).collect(),
        )
    }

    #[test]
    fn lookup_ignores_case() {
        for name in ["get", "GET", "gEt"] {
            assert_eq!(lookup(name.as_bytes()).map(|spec| spec.name), Some("get"));
        }
        assert!(lookup(b"nope").is_none());
    }

    #[test]
    fn command_names_match_the_table() {
        for spec in COMMANDS {
            let args = match spec.arity {
                Arity::Exact(n) | Arity::AtLeast(n) | Arity::Range(n, _) => n,
            };
            let parts = vec![Bytes::from("1"); args];

            let command = Command::try_from(Request::new(spec.name, parts)).unwrap();
            let name: &'static str = (&command).into();

            assert_eq!(name, spec.name);
        }
    }

    #[test]
    fn arity() {
        assert!(Arity::Exact(1).accepts(1));
        assert!(!Arity::Exact(1).accepts(2));
        assert!(Arity::AtLeast(0).accepts(0));
        assert!(!Arity::AtLeast(2).accepts(1));
        assert!(Arity::Range(1, 2).accepts(2));
        assert!(!Arity::Range(1, 2).accepts(3));
    }

    #[test]
    fn unknown_command() {
        let err = Command::try_from(request(&["FOO", "a", "b"])).unwrap_err();

        assert_eq!(
            err.to_string(),
            "ERR unknown command 'FOO', with args beginning with: 'a' 'b'"
        );
    }

    #[test]
    fn wrong_number_of_arguments() {
        let err = Command::try_from(request(&["GET"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ERR wrong number of arguments for 'get' command"
        );

        let err = Command::try_from(request(&["LPOP", "k", "1", "2"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ERR wrong number of arguments for 'lpop' command"
        );
    }

    #[test]
    fn parse_get_command() {
        let cmd = Command::try_from(request(&["GET", "foo"])).unwrap();

        assert_eq!(
            cmd,
            Command::Get(Get {
                key: Bytes::from("foo")
            })
        );
    }

    #[test]
    fn parse_set_command() {
        let cmd = Command::try_from(request(&["set", "foo", "baz"])).unwrap();

        assert_eq!(
            cmd,
            Command::Set(Set {
                key: Bytes::from("foo"),
                value: Bytes::from("baz")
            })
        );
    }

    #[test]
    fn parser_values() {
        let mut parser = CommandParser::new(vec![
            Bytes::from("12"),
            Bytes::from("x"),
            Bytes::from("1.5"),
            Bytes::from("nan"),
        ]);

        assert_eq!(parser.next_integer(), Ok(12));
        assert_eq!(parser.next_integer(), Err(CommandParserError::NotAnInteger));
        assert_eq!(parser.next_float(), Ok(1.5));
        assert_eq!(parser.next_float(), Err(CommandParserError::NotAFloat));
        assert_eq!(parser.next_bytes(), Err(CommandParserError::EndOfStream));
        assert!(!parser.has_remaining());
    }
}
