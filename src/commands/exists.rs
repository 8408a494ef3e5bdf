use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Returns how many of `keys` exist. A key mentioned several times is counted several times.
///
/// Ref: <https://redis.io/docs/latest/commands/exists/>
#[derive(Debug, PartialEq)]
pub struct Exists {
    pub keys: Vec<String>,
}

impl Executable for Exists {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let store = ctx.store().lock();
        let count = self.keys.iter().filter(|key| store.exists(key)).count();

        Ok(Frame::Integer(count as i64).into())
    }
}

impl TryFrom<&mut CommandParser> for Exists {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.rest_strings()?;
        Ok(Self { keys })
    }
}
