use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// The `CLIENT` subcommands client libraries send while setting up a connection. They are
/// acknowledged and otherwise ignored.
///
/// Ref: <https://redis.io/docs/latest/commands/client-setinfo/>
#[derive(Debug, PartialEq)]
pub struct Client {
    pub subcommand: String,
}

impl Executable for Client {
    fn exec(self, _ctx: &ExecutionContext) -> Result<Reply, Error> {
        match self.subcommand.as_str() {
            "SETINFO" | "SETNAME" => Ok(Frame::ok().into()),
            "GETNAME" => Ok(Frame::Null.into()),
            _ => Err(Error::InvalidArgument(format!(
                "unknown subcommand '{}'",
                self.subcommand.to_lowercase()
            ))),
        }
    }
}

impl TryFrom<&mut CommandParser> for Client {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?.to_uppercase();
        // Subcommand arguments are accepted as is.
        while parser.has_remaining() {
            parser.next_bytes()?;
        }

        Ok(Self { subcommand })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;

    #[tokio::test]
    async fn setinfo_is_acknowledged() {
        let harness = Harness::new();

        let result = harness
            .frame(&["CLIENT", "SETINFO", "LIB-NAME", "redis-rs"])
            .unwrap();

        assert_eq!(result, Frame::ok());
    }

    #[tokio::test]
    async fn unknown_subcommand() {
        let harness = Harness::new();

        let err = harness.frame(&["CLIENT", "KILL", "ID", "1"]).unwrap_err();

        assert_eq!(err.to_string(), "unknown subcommand 'kill'");
    }
}
