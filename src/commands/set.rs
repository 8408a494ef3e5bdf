use bytes::Bytes;
use tokio::time::Duration;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

#[derive(Debug, PartialEq)]
pub enum SetCondition {
    /// `NX`, only set the key if it does not already exist.
    NotExists,
    /// `XX`, only set the key if it already exists.
    Exists,
}

/// Set `key` to hold the string `value`, discarding any previous value and TTL.
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: String,
    pub value: Bytes,
    pub ttl: Option<Duration>,
    pub condition: Option<SetCondition>,
}

impl Executable for Set {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let mut store = ctx.store().lock();

        let exists = store.exists(&self.key);
        match self.condition {
            Some(SetCondition::NotExists) if exists => return Ok(Frame::Null.into()),
            Some(SetCondition::Exists) if !exists => return Ok(Frame::Null.into()),
            _ => {}
        }

        match self.ttl {
            Some(ttl) => store.set_with_ttl(self.key, self.value, ttl),
            None => store.set(self.key, self.value),
        }

        Ok(Frame::ok().into())
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let value = parser.next_bytes()?;

        let mut ttl = None;
        let mut condition = None;

        while parser.has_remaining() {
            let option = parser.next_string()?.to_uppercase();
            match option.as_str() {
                "EX" | "PX" if ttl.is_none() => {
                    let amount = parser.next_integer()?;
                    if amount <= 0 {
                        return Err(Error::InvalidArgument(
                            "invalid expire time in 'set' command".to_string(),
                        ));
                    }
                    ttl = Some(match option.as_str() {
                        "EX" => Duration::from_secs(amount as u64),
                        _ => Duration::from_millis(amount as u64),
                    });
                }
                "NX" if condition.is_none() => condition = Some(SetCondition::NotExists),
                "XX" if condition.is_none() => condition = Some(SetCondition::Exists),
                _ => return Err(Error::syntax()),
            }
        }

        Ok(Self {
            key,
            value,
            ttl,
            condition,
        })
    }
}
