use bytes::Bytes;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Returns the value associated with `field` in the hash stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/hget/>
#[derive(Debug, PartialEq)]
pub struct HGet {
    pub key: String,
    pub field: Bytes,
}

impl Executable for HGet {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let value = ctx.store().lock().hget(&self.key, &self.field)?;

        match value {
            Some(value) => Ok(Frame::Bulk(value).into()),
            None => Ok(Frame::Null.into()),
        }
    }
}

impl TryFrom<&mut CommandParser> for HGet {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let field = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self { key, field })
    }
}
