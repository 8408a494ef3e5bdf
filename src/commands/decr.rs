use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Decrements the number stored at `key` by one.
///
/// Ref: <https://redis.io/docs/latest/commands/decr/>
#[derive(Debug, PartialEq)]
pub struct Decr {
    pub key: String,
}

impl Executable for Decr {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let value = ctx.store().lock().incr_by(&self.key, -1_i64)?;
        Ok(Frame::Integer(value).into())
    }
}

impl TryFrom<&mut CommandParser> for Decr {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        parser.finish()?;

        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;

    #[tokio::test]
    async fn missing_key() {
        let harness = Harness::new();

        assert_eq!(harness.frame(&["DECR", "key"]).unwrap(), Frame::Integer(-1));
    }
}
