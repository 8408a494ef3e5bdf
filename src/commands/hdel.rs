use bytes::Bytes;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Removes the specified fields from the hash stored at `key`.
///
/// Ref: <https://redis.io/docs/latest/commands/hdel/>
#[derive(Debug, PartialEq)]
pub struct HDel {
    pub key: String,
    pub fields: Vec<Bytes>,
}

impl Executable for HDel {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let removed = ctx.store().lock().hdel(&self.key, &self.fields)?;
        Ok(Frame::Integer(removed as i64).into())
    }
}

impl TryFrom<&mut CommandParser> for HDel {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let mut fields = vec![parser.next_bytes()?];
        while parser.has_remaining() {
            fields.push(parser.next_bytes()?);
        }

        Ok(Self { key, fields })
    }
}
