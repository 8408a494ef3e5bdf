use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::error::ERROR_OVERFLOW;
use crate::frame::Frame;
use crate::Error;

/// Decrements the number stored at key by `decrement`.
///
/// Ref: <https://redis.io/docs/latest/commands/decrby/>
#[derive(Debug, PartialEq)]
pub struct DecrBy {
    pub key: String,
    pub decrement: i64,
}

impl Executable for DecrBy {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let increment = self
            .decrement
            .checked_neg()
            .ok_or_else(|| Error::Arithmetic(ERROR_OVERFLOW.to_string()))?;
        let value = ctx.store().lock().incr_by(&self.key, increment)?;

        Ok(Frame::Integer(value).into())
    }
}

impl TryFrom<&mut CommandParser> for DecrBy {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let decrement = parser.next_integer()?;
        parser.finish()?;

        Ok(Self { key, decrement })
    }
}
