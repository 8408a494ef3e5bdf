use bytes::Bytes;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// If `key` already exists and is a string, this command appends the value at the end of the
/// string. If `key` does not exist it is created and set as an empty string, so APPEND will be
/// similar to SET in this special case.
///
/// Ref: <https://redis.io/docs/latest/commands/append/>
#[derive(Debug, PartialEq)]
pub struct Append {
    pub key: String,
    pub value: Bytes,
}

impl Executable for Append {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let len = ctx.store().lock().append(&self.key, &self.value)?;
        Ok(Frame::Integer(len as i64).into())
    }
}

impl TryFrom<&mut CommandParser> for Append {
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
    async fn append_to_missing_and_existing_key() {
        let harness = Harness::new();

        assert_eq!(
            harness.frame(&["APPEND", "key", "Hello"]).unwrap(),
            Frame::Integer(5)
        );
        assert_eq!(
            harness.frame(&["APPEND", "key", " World"]).unwrap(),
            Frame::Integer(11)
        );
        assert_eq!(
            harness.store().lock().get("key").unwrap(),
            Some(Bytes::from("Hello World"))
        );
    }
}
