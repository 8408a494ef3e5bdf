use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Get the value of `key` and delete the key.
///
/// Ref: <https://redis.io/docs/latest/commands/getdel/>
#[derive(Debug, PartialEq)]
pub struct Getdel {
    pub key: String,
}

impl Executable for Getdel {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let mut store = ctx.store().lock();

        match store.get(&self.key)? {
            Some(value) => {
                store.remove(&self.key);
                Ok(Frame::Bulk(value).into())
            }
            None => Ok(Frame::Null.into()),
        }
    }
}

impl TryFrom<&mut CommandParser> for Getdel {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;

        Ok(Self { key })
    }
}
