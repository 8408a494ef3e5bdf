use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Returns the remaining time to live of a key that has a timeout, in seconds. -2 if the key
/// does not exist, -1 if it has no associated expire.
///
/// Ref: <https://redis.io/docs/latest/commands/ttl/>
#[derive(Debug, PartialEq)]
pub struct Ttl {
    pub key: String,
}

impl Executable for Ttl {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let store = ctx.store().lock();

        let ttl = match store.get_ttl(&self.key) {
            Some(ttl) => ((ttl.as_millis() + 500) / 1000) as i64,
            None if store.exists(&self.key) => -1,
            None => -2,
        };

        Ok(Frame::Integer(ttl).into())
    }
}

impl TryFrom<&mut CommandParser> for Ttl {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;

        Ok(Self { key })
    }
}
