use bytes::Bytes;
use glob_match::glob_match;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns all keys matching `pattern`, sorted. Runs on the worker pool.
///
/// Ref: <https://redis.io/docs/latest/commands/keys/>
#[derive(Debug, PartialEq)]
pub struct Keys {
    pub pattern: String,
}

impl Keys {
    pub fn run(self, store: &Store) -> Result<Frame, Error> {
        let store = store.lock();
        let mut keys = store
            .keys()
            .filter(|key| glob_match(&self.pattern, key))
            .cloned()
            .collect::<Vec<_>>();
        keys.sort();

        let res = keys
            .into_iter()
            .map(|key| Frame::Bulk(Bytes::from(key)))
            .collect();

        Ok(Frame::Array(res))
    }
}

impl Executable for Keys {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let store = ctx.store().clone();
        Ok(ctx.defer(move || self.run(&store)))
    }
}

impl TryFrom<&mut CommandParser> for Keys {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let pattern = parser.next_string()?;
        parser.finish()?;

        Ok(Self { pattern })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{parse, Harness};

    fn harness_with_keys() -> Harness {
        let harness = Harness::new();
        {
            let mut store = harness.store().lock();
            for key in ["firstname", "lastname", "age"] {
                store.set(key.to_string(), Bytes::from("x"));
            }
        }
        harness
    }

    #[tokio::test]
    async fn with_wildcard_pattern() {
        let harness = harness_with_keys();

        let keys: Keys = parse(&["KEYS", "*name"]).unwrap();

        assert_eq!(
            keys.run(harness.store()).unwrap(),
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("firstname")),
                Frame::Bulk(Bytes::from("lastname")),
            ])
        );
    }

    #[tokio::test]
    async fn with_all_pattern() {
        let harness = harness_with_keys();

        let keys: Keys = parse(&["KEYS", "*"]).unwrap();

        let Frame::Array(res) = keys.run(harness.store()).unwrap() else {
            panic!("expected an array");
        };
        assert_eq!(res.len(), 3);
    }

    #[test]
    fn missing_pattern() {
        let err = parse::<Keys>(&["KEYS"]).unwrap_err();

        assert!(matches!(err, Error::ParameterMismatch(_)));
    }
}
