use bytes::Bytes;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Authenticates the connection against the server's shared secret.
///
/// Ref: <https://redis.io/docs/latest/commands/auth/>
#[derive(Debug, PartialEq)]
pub struct Auth {
    pub password: Bytes,
}

impl Executable for Auth {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let Some(secret) = ctx.password() else {
            return Ok(Frame::error("Client sent AUTH, but no password is set").into());
        };

        if *secret != self.password {
            return Ok(Frame::custom_error(
                "WRONGPASS invalid username-password pair or user is disabled.",
            )
            .into());
        }

        ctx.mark_authenticated();
        Ok(Frame::ok().into())
    }
}

impl TryFrom<&mut CommandParser> for Auth {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        // AUTH [username] password, only the password is checked.
        let mut password = parser.next_bytes()?;
        if parser.has_remaining() {
            password = parser.next_bytes()?;
        }
        parser.finish()?;

        Ok(Self { password })
    }
}
