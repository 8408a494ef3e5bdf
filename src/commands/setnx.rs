use bytes::Bytes;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Set `key` to hold string `value` if `key` does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/setnx/>
#[derive(Debug, PartialEq)]
pub struct Setnx {
    pub key: String,
    pub value: Bytes,
}

impl Executable for Setnx {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let mut store = ctx.store().lock();

        if store.exists(&self.key) {
            return Ok(Frame::Integer(0).into());
        }

        store.set(self.key, self.value);
        Ok(Frame::Integer(1).into())
    }
}

impl TryFrom<&mut CommandParser> for Setnx {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let value = parser.next_bytes()?;
        parser.finish()?;

        Ok(Self { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;

    #[tokio::test]
    async fn only_sets_missing_keys() {
        let harness = Harness::new();

        assert_eq!(
            harness.frame(&["SETNX", "key", "Hello"]).unwrap(),
            Frame::Integer(1)
        );
        assert_eq!(
            harness.frame(&["SETNX", "key", "World"]).unwrap(),
            Frame::Integer(0)
        );
        assert_eq!(
            harness.store().lock().get("key").unwrap(),
            Some(Bytes::from("Hello"))
        );
    }
}
