use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Increments the number stored at `key` by `increment`.
///
/// Ref: <https://redis.io/docs/latest/commands/incrby/>
#[derive(Debug, PartialEq)]
pub struct IncrBy {
    pub key: String,
    pub increment: i64,
}

impl Executable for IncrBy {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let value = ctx.store().lock().incr_by(&self.key, self.increment)?;
        Ok(Frame::Integer(value).into())
    }
}

impl TryFrom<&mut CommandParser> for IncrBy {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let increment = parser.next_integer()?;
        parser.finish()?;

        Ok(Self { key, increment })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{parse, Harness};
    use bytes::Bytes;

    #[test]
    fn parse_increment() {
        let incr_by: IncrBy = parse(&["INCRBY", "key1", "-7"]).unwrap();

        assert_eq!(
            incr_by,
            IncrBy {
                key: "key1".to_string(),
                increment: -7
            }
        );
    }

    #[tokio::test]
    async fn existing_key() {
        let harness = Harness::new();
        harness
            .store()
            .lock()
            .set("key1".to_string(), Bytes::from("10"));

        assert_eq!(
            harness.frame(&["INCRBY", "key1", "5"]).unwrap(),
            Frame::Integer(15)
        );
    }

    #[test]
    fn invalid_increment() {
        let err = parse::<IncrBy>(&["INCRBY", "key1", "ten"]).unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
