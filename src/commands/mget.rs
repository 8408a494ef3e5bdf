use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the values of all specified keys. For every key that does not hold a string value or
/// does not exist, the special value nil is returned. Runs on the worker pool.
///
/// Ref: <https://redis.io/docs/latest/commands/mget/>
#[derive(Debug, PartialEq)]
pub struct Mget {
    pub keys: Vec<String>,
}

impl Mget {
    pub fn run(self, store: &Store) -> Result<Frame, Error> {
        let store = store.lock();
        let values = self
            .keys
            .iter()
            .map(|key| match store.get(key) {
                Ok(Some(value)) => Frame::Bulk(value),
                _ => Frame::Null,
            })
            .collect();

        Ok(Frame::Array(values))
    }
}

impl Executable for Mget {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let store = ctx.store().clone();
        Ok(ctx.defer(move || self.run(&store)))
    }
}

impl TryFrom<&mut CommandParser> for Mget {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let keys = parser.rest_strings()?;
        Ok(Self { keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{parse, Harness};
    use bytes::Bytes;

    #[tokio::test]
    async fn mixed_keys() {
        let harness = Harness::new();
        {
            let mut store = harness.store().lock();
            store.set("key1".to_string(), Bytes::from("1"));
            store.hset("h", Bytes::from("f"), Bytes::from("v")).unwrap();
        }

        let mget: Mget = parse(&["MGET", "key1", "nope", "h"]).unwrap();

        assert_eq!(
            mget.run(harness.store()).unwrap(),
            Frame::Array(vec![Frame::Bulk(Bytes::from("1")), Frame::Null, Frame::Null])
        );
    }
}
