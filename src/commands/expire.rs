use tokio::time::Duration;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Set a timeout on `key`, in seconds. A non positive timeout deletes the key.
///
/// Ref: <https://redis.io/docs/latest/commands/expire/>
#[derive(Debug, PartialEq)]
pub struct Expire {
    pub key: String,
    pub seconds: i64,
}

impl Executable for Expire {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let mut store = ctx.store().lock();

        let applied = match self.seconds {
            seconds if seconds <= 0 => store.remove(&self.key).is_some(),
            seconds => store.expire(&self.key, Duration::from_secs(seconds as u64)),
        };

        Ok(Frame::Integer(applied as i64).into())
    }
}

impl TryFrom<&mut CommandParser> for Expire {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let seconds = parser.next_integer()?;
        parser.finish()?;

        Ok(Self { key, seconds })
    }
}
