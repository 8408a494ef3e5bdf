use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Removes the specified keys. A key is ignored if it does not exist. Runs on the worker pool.
///
/// Ref: <https://redis.io/docs/latest/commands/del/>
#[derive(Debug, PartialEq)]
pub struct Del {
    pub keys: Vec<String>,
}

impl Del {
    pub fn run(self, store: &Store) -> Result<Frame, Error> {
        let mut store = store.lock();
        let count = self
            .keys
            .iter()
            .filter(|key| store.remove(key).is_some())
            .count();

        Ok(Frame::Integer(count as i64))
    }
}

impl Executable for Del {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let store = ctx.store().clone();
        Ok(ctx.defer(move || self.run(&store)))
    }
}

impl TryFrom<&mut CommandParser> for Del {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.rest_strings()?;
        Ok(Self { keys })
    }
}
