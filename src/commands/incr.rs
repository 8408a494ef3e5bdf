use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Increments the number stored at `key` by one. If the key does not exist, it is set to 0
/// before performing the operation. An error is returned if the key contains a value that can
/// not be represented as a 64 bit signed integer.
///
/// Ref: <https://redis.io/docs/latest/commands/incr/>
#[derive(Debug, PartialEq)]
pub struct Incr {
    pub key: String,
}

impl Executable for Incr {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let value = ctx.store().lock().incr_by(&self.key, 1_i64)?;
        Ok(Frame::Integer(value).into())
    }
}

impl TryFrom<&mut CommandParser> for Incr {
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
    async fn missing_key_starts_at_zero() {
        let harness = Harness::new();

        assert_eq!(harness.frame(&["INCR", "key"]).unwrap(), Frame::Integer(1));
        assert_eq!(harness.frame(&["INCR", "key"]).unwrap(), Frame::Integer(2));
    }

    #[tokio::test]
    async fn non_integer_value() {
        let harness = Harness::new();
        harness
            .store()
            .lock()
            .set("key".to_string(), Bytes::from("abc"));

        let err = harness.frame(&["INCR", "key"]).unwrap_err();

        assert_eq!(err.to_string(), "value is not an integer or out of range");
    }

    #[tokio::test]
    async fn overflow() {
        let harness = Harness::new();
        harness
            .store()
            .lock()
            .set("key".to_string(), Bytes::from(i64::MAX.to_string()));

        let err = harness.frame(&["INCR", "key"]).unwrap_err();

        assert!(matches!(err, Error::Arithmetic(_)));
    }
}
