use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Any command name the server does not recognise.
#[derive(Debug, PartialEq)]
pub struct Unknown {
    pub name: String,
}

impl Executable for Unknown {
    fn exec(self, _ctx: &ExecutionContext) -> Result<Reply, Error> {
        Ok(Frame::error(format!("unknown command '{}'", self.name)).into())
    }
}

impl TryFrom<&mut CommandParser> for Unknown {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self {
            name: parser.command_name().to_string(),
        })
    }
}
