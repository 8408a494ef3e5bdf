use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Return the number of keys in the currently-selected database. Runs on the worker pool.
///
/// Ref: <https://redis.io/docs/latest/commands/dbsize/>
#[derive(Debug, PartialEq)]
pub struct DBSize;

impl DBSize {
    pub fn run(self, store: &Store) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.lock().size() as i64))
    }
}

impl Executable for DBSize {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let store = ctx.store().clone();
        Ok(ctx.defer(move || self.run(&store)))
    }
}

impl TryFrom<&mut CommandParser> for DBSize {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        parser.finish()?;
        Ok(Self)
    }
}
