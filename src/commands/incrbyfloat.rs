use bytes::Bytes;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::error::ERROR_NOT_FLOAT;
use crate::frame::Frame;
use crate::Error;

/// Increment the string representing a floating point number stored at key by the specified
/// increment. If the key does not exist, it is set to 0 before performing the operation.
///
/// Ref: <https://redis.io/docs/latest/commands/incrbyfloat/>
#[derive(Debug, PartialEq)]
pub struct IncrByFloat {
    pub key: String,
    pub increment: f64,
}

impl Executable for IncrByFloat {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let mut store = ctx.store().lock();

        let current = match store.get(&self.key)? {
            Some(value) => std::str::from_utf8(&value)
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or_else(|| Error::InvalidArgument(ERROR_NOT_FLOAT.to_string()))?,
            None => 0.0,
        };

        let value = current + self.increment;
        if !value.is_finite() {
            return Err(Error::Arithmetic(
                "increment would produce NaN or Infinity".to_string(),
            ));
        }

        let value = Bytes::from(value.to_string());
        store.replace(&self.key, value.clone());

        Ok(Frame::Bulk(value).into())
    }
}

impl TryFrom<&mut CommandParser> for IncrByFloat {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let increment = parser.next_float()?;
        parser.finish()?;

        Ok(Self { key, increment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;

    #[tokio::test]
    async fn increments_floats() {
        let harness = Harness::new();
        harness
            .store()
            .lock()
            .set("key".to_string(), Bytes::from("10.50"));

        assert_eq!(
            harness.frame(&["INCRBYFLOAT", "key", "0.25"]).unwrap(),
            Frame::Bulk(Bytes::from("10.75"))
        );
        assert_eq!(
            harness.frame(&["INCRBYFLOAT", "other", "-5"]).unwrap(),
            Frame::Bulk(Bytes::from("-5"))
        );
    }

    #[tokio::test]
    async fn rejects_non_float_values() {
        let harness = Harness::new();
        harness
            .store()
            .lock()
            .set("key".to_string(), Bytes::from("abc"));

        let err = harness.frame(&["INCRBYFLOAT", "key", "1"]).unwrap_err();

        assert_eq!(err.to_string(), "value is not a valid float");
    }
}
