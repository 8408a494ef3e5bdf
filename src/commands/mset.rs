use bytes::Bytes;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Sets the given keys to their respective values. Runs on the worker pool.
///
/// Ref: <https://redis.io/docs/latest/commands/mset/>
#[derive(Debug, PartialEq)]
pub struct Mset {
    pub pairs: Vec<(String, Bytes)>,
}

impl Mset {
    pub fn run(self, store: &Store) -> Result<Frame, Error> {
        let mut store = store.lock();
        for (key, value) in self.pairs {
            store.set(key, value);
        }

        Ok(Frame::ok())
    }
}

impl Executable for Mset {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let store = ctx.store().clone();
        Ok(ctx.defer(move || self.run(&store)))
    }
}

impl TryFrom<&mut CommandParser> for Mset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        if parser.remaining() == 0 || parser.remaining() % 2 != 0 {
            return Err(Error::wrong_number_of_arguments(parser.command_name()));
        }

        let mut pairs = vec![];
        while parser.has_remaining() {
            pairs.push((parser.next_string()?, parser.next_bytes()?));
        }

        Ok(Self { pairs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{parse, Harness};

    #[test]
    fn parse_odd_arguments() {
        let err = parse::<Mset>(&["MSET", "a", "1", "b"]).unwrap_err();

        assert_eq!(err.to_string(), "wrong number of arguments for 'mset' command");
    }

    #[tokio::test]
    async fn sets_every_pair() {
        let harness = Harness::new();

        let mset: Mset = parse(&["MSET", "a", "1", "b", "2"]).unwrap();

        assert_eq!(mset.run(harness.store()).unwrap(), Frame::ok());

        let store = harness.store().lock();
        assert_eq!(store.get("a").unwrap(), Some(Bytes::from("1")));
        assert_eq!(store.get("b").unwrap(), Some(Bytes::from("2")));
    }
}
