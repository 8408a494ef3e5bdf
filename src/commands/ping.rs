use bytes::Bytes;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Returns PONG if no argument is provided, otherwise return a copy of the argument as a bulk.
///
/// Ref: <https://redis.io/docs/latest/commands/ping/>
#[derive(Debug, PartialEq)]
pub struct Ping {
    pub payload: Option<Bytes>,
}

impl Executable for Ping {
    fn exec(self, _ctx: &ExecutionContext) -> Result<Reply, Error> {
        let frame = match self.payload {
            Some(payload) => Frame::Bulk(payload),
            None => Frame::Simple("PONG".to_string()),
        };
        Ok(frame.into())
    }
}

impl TryFrom<&mut CommandParser> for Ping {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let payload = match parser.has_remaining() {
            true => Some(parser.next_bytes()?),
            false => None,
        };
        parser.finish()?;

        Ok(Self { payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;

    #[tokio::test]
    async fn without_payload() {
        let harness = Harness::new();

        let result = harness.frame(&["PING"]).unwrap();

        assert_eq!(result, Frame::Simple("PONG".to_string()));
    }

    #[tokio::test]
    async fn with_payload() {
        let harness = Harness::new();

        let result = harness.frame(&["PING", "hello"]).unwrap();

        assert_eq!(result, Frame::Bulk(Bytes::from("hello")));
    }

    #[tokio::test]
    async fn with_too_many_arguments() {
        let harness = Harness::new();

        let err = harness.frame(&["PING", "a", "b"]).unwrap_err();

        assert_eq!(err.to_string(), "wrong number of arguments for 'ping' command");
    }
}
