pub mod append;
pub mod auth;
pub mod client;
pub mod config;
pub mod dbsize;
pub mod decr;
pub mod decrby;
pub mod del;
pub mod echo;
pub mod executable;
pub mod exists;
pub mod expire;
pub mod flushall;
pub mod get;
pub mod getdel;
pub mod hdel;
pub mod hget;
pub mod hgetall;
pub mod hset;
pub mod incr;
pub mod incrby;
pub mod incrbyfloat;
pub mod info;
pub mod keys;
pub mod mget;
pub mod mset;
pub mod ping;
pub mod publish;
pub mod quit;
pub mod select;
pub mod set;
pub mod setnx;
pub mod shutdown;
pub mod strlen;
pub mod ttl;
pub mod type_;
pub mod unknown;

use bytes::Bytes;
use std::fmt;
use std::str::{self, FromStr};
use std::time::Instant;
use std::vec;
use strum_macros::{AsRefStr, Display, EnumCount, EnumIter, EnumString};
use thiserror::Error as ThisError;

use crate::context::ExecutionContext;
use crate::error::{Error, ERROR_NOT_FLOAT};
use crate::frame::Frame;

pub use executable::{Executable, Reply};

use append::Append;
use auth::Auth;
use client::Client;
use config::Config;
use dbsize::DBSize;
use decr::Decr;
use decrby::DecrBy;
use del::Del;
use echo::Echo;
use exists::Exists;
use expire::Expire;
use flushall::FlushAll;
use get::Get;
use getdel::Getdel;
use hdel::HDel;
use hget::HGet;
use hgetall::HGetAll;
use hset::HSet;
use incr::Incr;
use incrby::IncrBy;
use incrbyfloat::IncrByFloat;
use info::Info;
use keys::Keys;
use mget::Mget;
use mset::Mset;
use ping::Ping;
use publish::Publish;
use quit::Quit;
use select::Select;
use set::Set;
use setnx::Setnx;
use shutdown::Shutdown;
use strlen::Strlen;
use ttl::Ttl;
use type_::Type;
use unknown::Unknown;

/// Every command name the server recognises.
///
/// Besides naming the command, the type decides how the dispatcher treats it: whether it
/// runs on the background workers (`is_async`), whether it is gated behind the
/// `enable-unsupported-commands` setting (`is_supported`) and whether it has an
/// implementation at all (`is_implemented`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    AsRefStr,
    Display,
    EnumCount,
    EnumIter,
    EnumString,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum CommandType {
    // Connection
    Auth,
    Client,
    Echo,
    Ping,
    Quit,
    Select,

    // Server
    Config,
    DBSize,
    FlushAll,
    Info,
    Shutdown,

    // Strings
    Append,
    Decr,
    DecrBy,
    Get,
    Getdel,
    Incr,
    IncrBy,
    IncrByFloat,
    Mget,
    Mset,
    Set,
    Setnx,
    Strlen,

    // Keys
    Del,
    Exists,
    Expire,
    Keys,
    Ttl,
    Type,

    // Hashes
    HDel,
    HGet,
    HGetAll,
    HSet,

    // Pub/sub
    Publish,
    Subscribe,
    Unsubscribe,

    // Transactions
    Exec,
    Multi,
    Watch,

    Unknown,
}

impl CommandType {
    /// Commands whose bodies run on the background worker pool and complete later.
    pub fn is_async(self) -> bool {
        matches!(
            self,
            CommandType::Del
                | CommandType::Mget
                | CommandType::Mset
                | CommandType::Keys
                | CommandType::DBSize
                | CommandType::FlushAll
        )
    }

    pub fn is_supported(self) -> bool {
        !matches!(
            self,
            CommandType::Setnx | CommandType::Getdel | CommandType::IncrByFloat
        )
    }

    pub fn is_implemented(self) -> bool {
        !matches!(
            self,
            CommandType::Subscribe
                | CommandType::Unsubscribe
                | CommandType::Multi
                | CommandType::Exec
                | CommandType::Watch
        )
    }
}

/// Arrival sequence number of a command on its connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandId(pub u64);

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One decoded client request. Arguments are kept raw and only parsed when the command runs.
#[derive(Debug, PartialEq)]
pub struct Command {
    id: CommandId,
    command_type: CommandType,
    name: String,
    args: Vec<Bytes>,
    async_start: Option<Instant>,
}

impl Command {
    pub fn new(name: &str, args: Vec<Bytes>) -> Command {
        let command_type = CommandType::from_str(name).unwrap_or(CommandType::Unknown);

        Command {
            id: CommandId::default(),
            command_type,
            name: name.to_string(),
            args,
            async_start: None,
        }
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: CommandId) {
        self.id = id;
    }

    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    /// The command name exactly as the client sent it.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Bytes] {
        &self.args
    }

    pub fn is_async(&self) -> bool {
        self.command_type.is_async()
    }

    pub fn is_supported(&self) -> bool {
        self.command_type.is_supported()
    }

    pub fn is_implemented(&self) -> bool {
        self.command_type.is_implemented()
    }

    pub fn is_of_type(&self, command_type: CommandType) -> bool {
        self.command_type == command_type
    }

    pub fn async_start(&self) -> Option<Instant> {
        self.async_start
    }

    pub(crate) fn set_async_start(&mut self, start: Instant) {
        self.async_start = Some(start);
    }

    /// Parses the arguments and runs the command against `ctx`.
    pub fn execute(&self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let parser = &mut CommandParser::new(self);

        match self.command_type {
            CommandType::Append => Append::try_from(parser)?.exec(ctx),
            CommandType::Auth => Auth::try_from(parser)?.exec(ctx),
            CommandType::Client => Client::try_from(parser)?.exec(ctx),
            CommandType::Config => Config::try_from(parser)?.exec(ctx),
            CommandType::DBSize => DBSize::try_from(parser)?.exec(ctx),
            CommandType::Decr => Decr::try_from(parser)?.exec(ctx),
            CommandType::DecrBy => DecrBy::try_from(parser)?.exec(ctx),
            CommandType::Del => Del::try_from(parser)?.exec(ctx),
            CommandType::Echo => Echo::try_from(parser)?.exec(ctx),
            CommandType::Exists => Exists::try_from(parser)?.exec(ctx),
            CommandType::Expire => Expire::try_from(parser)?.exec(ctx),
            CommandType::FlushAll => FlushAll::try_from(parser)?.exec(ctx),
            CommandType::Get => Get::try_from(parser)?.exec(ctx),
            CommandType::Getdel => Getdel::try_from(parser)?.exec(ctx),
            CommandType::HDel => HDel::try_from(parser)?.exec(ctx),
            CommandType::HGet => HGet::try_from(parser)?.exec(ctx),
            CommandType::HGetAll => HGetAll::try_from(parser)?.exec(ctx),
            CommandType::HSet => HSet::try_from(parser)?.exec(ctx),
            CommandType::Incr => Incr::try_from(parser)?.exec(ctx),
            CommandType::IncrBy => IncrBy::try_from(parser)?.exec(ctx),
            CommandType::IncrByFloat => IncrByFloat::try_from(parser)?.exec(ctx),
            CommandType::Info => Info::try_from(parser)?.exec(ctx),
            CommandType::Keys => Keys::try_from(parser)?.exec(ctx),
            CommandType::Mget => Mget::try_from(parser)?.exec(ctx),
            CommandType::Mset => Mset::try_from(parser)?.exec(ctx),
            CommandType::Ping => Ping::try_from(parser)?.exec(ctx),
            CommandType::Publish => Publish::try_from(parser)?.exec(ctx),
            CommandType::Quit => Quit::try_from(parser)?.exec(ctx),
            CommandType::Select => Select::try_from(parser)?.exec(ctx),
            CommandType::Set => Set::try_from(parser)?.exec(ctx),
            CommandType::Setnx => Setnx::try_from(parser)?.exec(ctx),
            CommandType::Shutdown => Shutdown::try_from(parser)?.exec(ctx),
            CommandType::Strlen => Strlen::try_from(parser)?.exec(ctx),
            CommandType::Ttl => Ttl::try_from(parser)?.exec(ctx),
            CommandType::Type => Type::try_from(parser)?.exec(ctx),
            CommandType::Unknown => Unknown::try_from(parser)?.exec(ctx),
            CommandType::Subscribe
            | CommandType::Unsubscribe
            | CommandType::Multi
            | CommandType::Exec
            | CommandType::Watch => Err(Error::Internal(format!(
                "{} reached execution without an implementation",
                self.command_type
            ))),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.name)?;
        for arg in self.args.iter().take(8) {
            write!(f, " {}", String::from_utf8_lossy(arg))?;
        }
        if self.args.len() > 8 {
            write!(f, " ... ({} more)", self.args.len() - 8)?;
        }
        Ok(())
    }
}

impl TryFrom<Frame> for Command {
    type Error = Error;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the Redis server as RESP arrays.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                }
                .into())
            }
        };

        let mut parts = frames.into_iter();
        let name = match parts.next() {
            Some(Frame::Simple(s)) => s,
            Some(Frame::Bulk(bytes)) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String)?,
            Some(frame) => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "simple or bulk string".to_string(),
                    actual: frame,
                }
                .into())
            }
            None => return Err(CommandParserError::EmptyCommand.into()),
        };

        let args = parts
            .map(|frame| match frame {
                Frame::Simple(s) => Ok(Bytes::from(s)),
                Frame::Bulk(bytes) => Ok(bytes),
                Frame::Integer(i) => Ok(Bytes::from(i.to_string())),
                frame => Err(CommandParserError::InvalidFrame {
                    expected: "simple or bulk string".to_string(),
                    actual: frame,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Command::new(&name, args))
    }
}

/// Walks a command's arguments. Running out of arguments, or leaving some unread, is reported
/// as a wrong number of arguments for the command.
pub struct CommandParser {
    name: String,
    parts: vec::IntoIter<Bytes>,
}

impl CommandParser {
    pub(crate) fn new(command: &Command) -> CommandParser {
        CommandParser {
            name: command.name.clone(),
            parts: command.args.clone().into_iter(),
        }
    }

    pub fn command_name(&self) -> &str {
        &self.name
    }

    pub fn remaining(&self) -> usize {
        self.parts.len()
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    pub fn next_bytes(&mut self) -> Result<Bytes, Error> {
        self.parts
            .next()
            .ok_or_else(|| Error::wrong_number_of_arguments(&self.name))
    }

    pub fn next_string(&mut self) -> Result<String, Error> {
        let bytes = self.next_bytes()?;
        str::from_utf8(&bytes[..])
            .map(|s| s.to_string())
            .map_err(|_| Error::InvalidArgument("invalid UTF-8 string".to_string()))
    }

    pub fn next_integer(&mut self) -> Result<i64, Error> {
        let bytes = self.next_bytes()?;
        str::from_utf8(&bytes[..])
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or_else(Error::not_an_integer)
    }

    pub fn next_float(&mut self) -> Result<f64, Error> {
        let bytes = self.next_bytes()?;
        str::from_utf8(&bytes[..])
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|f| f.is_finite())
            .ok_or_else(|| Error::InvalidArgument(ERROR_NOT_FLOAT.to_string()))
    }

    /// Collects every argument left, requiring at least one.
    pub fn rest_strings(&mut self) -> Result<Vec<String>, Error> {
        let mut values = vec![self.next_string()?];
        while self.has_remaining() {
            values.push(self.next_string()?);
        }
        Ok(values)
    }

    /// Fails if arguments are left over.
    pub fn finish(&self) -> Result<(), Error> {
        if self.has_remaining() {
            return Err(Error::wrong_number_of_arguments(&self.name));
        }
        Ok(())
    }
}

/// Failures turning a decoded frame into a command.
#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("empty command")]
    EmptyCommand,
}
