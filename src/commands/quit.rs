use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Asks the server to close the connection once the reply has been written.
///
/// Ref: <https://redis.io/docs/latest/commands/quit/>
#[derive(Debug, PartialEq)]
pub struct Quit;

impl Executable for Quit {
    fn exec(self, _ctx: &ExecutionContext) -> Result<Reply, Error> {
        Ok(Frame::ok().into())
    }
}

impl TryFrom<&mut CommandParser> for Quit {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        parser.finish()?;
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{command, Harness};

    #[tokio::test]
    async fn replies_then_closes() {
        let mut harness = Harness::new();

        harness.dispatcher.on_command_received(command(&["QUIT"]));
        harness.dispatcher.on_command_received(command(&["PING"]));

        assert_eq!(harness.output.recv().await, Some(Frame::ok()));
        assert_eq!(harness.output.recv().await, None);
        assert!(harness.dispatcher.is_closed());
    }
}
