use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Select the Redis logical database. Only database 0 exists.
///
/// Ref: <https://redis.io/docs/latest/commands/select/>
#[derive(Debug, PartialEq)]
pub struct Select {
    pub index: i64,
}

impl Executable for Select {
    fn exec(self, _ctx: &ExecutionContext) -> Result<Reply, Error> {
        if self.index != 0 {
            return Err(Error::InvalidArgument("DB index is out of range".to_string()));
        }
        Ok(Frame::ok().into())
    }
}

impl TryFrom<&mut CommandParser> for Select {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let index = parser.next_integer()?;
        parser.finish()?;

        Ok(Self { index })
    }
}
