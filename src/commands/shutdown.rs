use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Stops the server. Nothing is persisted, so `SAVE` and `NOSAVE` are accepted and ignored.
///
/// Ref: <https://redis.io/docs/latest/commands/shutdown/>
#[derive(Debug, PartialEq)]
pub struct Shutdown;

impl Executable for Shutdown {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        ctx.shutdown();
        Ok(Frame::ok().into())
    }
}

impl TryFrom<&mut CommandParser> for Shutdown {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        while parser.has_remaining() {
            match parser.next_string()?.to_uppercase().as_str() {
                "SAVE" | "NOSAVE" | "NOW" | "FORCE" => {}
                _ => return Err(Error::syntax()),
            }
        }
        Ok(Self)
    }
}
