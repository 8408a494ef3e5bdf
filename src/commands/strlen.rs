use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Returns the length of the string value stored at `key`, 0 when the key does not exist.
///
/// Ref: <https://redis.io/docs/latest/commands/strlen/>
#[derive(Debug, PartialEq)]
pub struct Strlen {
    pub key: String,
}

impl Executable for Strlen {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let len = ctx
            .store()
            .lock()
            .get(&self.key)?
            .map_or(0, |value| value.len());

        Ok(Frame::Integer(len as i64).into())
    }
}

impl TryFrom<&mut CommandParser> for Strlen {
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
    use bytes::Bytes;

    #[tokio::test]
    async fn existing_and_missing_keys() {
        let harness = Harness::new();
        harness
            .store()
            .lock()
            .set("key".to_string(), Bytes::from("Hello world"));

        assert_eq!(harness.frame(&["STRLEN", "key"]).unwrap(), Frame::Integer(11));
        assert_eq!(harness.frame(&["STRLEN", "nope"]).unwrap(), Frame::Integer(0));
    }
}
