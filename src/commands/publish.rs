use bytes::Bytes;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Posts a message to the given channel. Returns the number of subscribers that received it.
///
/// Ref: <https://redis.io/docs/latest/commands/publish/>
#[derive(Debug, PartialEq)]
pub struct Publish {
    pub channel: String,
    pub message: Bytes,
}

impl Executable for Publish {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let receivers = ctx.pubsub().publish(&self.channel, self.message);
        Ok(Frame::Integer(receivers as i64).into())
    }
}

impl TryFrom<&mut CommandParser> for Publish {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let channel = parser.next_string()?;
        let message = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self { channel, message })
    }
}
