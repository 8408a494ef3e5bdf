use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Delete all the keys of all the existing databases. Runs on the worker pool, whether or not
/// `ASYNC` is given.
///
/// Ref: <https://redis.io/docs/latest/commands/flushall/>
#[derive(Debug, PartialEq)]
pub struct FlushAll;

impl FlushAll {
    pub fn run(self, store: &Store) -> Result<Frame, Error> {
        store.lock().clear();
        Ok(Frame::ok())
    }
}

impl Executable for FlushAll {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let store = ctx.store().clone();
        Ok(ctx.defer(move || self.run(&store)))
    }
}

impl TryFrom<&mut CommandParser> for FlushAll {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.has_remaining() {
            match parser.next_string()?.to_uppercase().as_str() {
                "ASYNC" | "SYNC" => {}
                _ => return Err(Error::syntax()),
            }
        }
        parser.finish()?;

        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{parse, Harness};
    use bytes::Bytes;

    #[tokio::test]
    async fn removes_everything() {
        let harness = Harness::new();
        {
            let mut store = harness.store().lock();
            store.set("a".to_string(), Bytes::from("1"));
            store.hset("h", Bytes::from("f"), Bytes::from("v")).unwrap();
        }

        let flush: FlushAll = parse(&["FLUSHALL", "ASYNC"]).unwrap();

        assert_eq!(flush.run(harness.store()).unwrap(), Frame::ok());
        assert_eq!(harness.store().lock().size(), 0);
    }

    #[test]
    fn unknown_mode() {
        let err = parse::<FlushAll>(&["FLUSHALL", "LATER"]).unwrap_err();

        assert_eq!(err.to_string(), "syntax error");
    }
}
