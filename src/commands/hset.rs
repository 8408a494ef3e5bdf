use bytes::Bytes;
use itertools::Itertools;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Sets the specified fields to their respective values in the hash stored at `key`.
/// Returns the number of fields that were added.
///
/// Ref: <https://redis.io/docs/latest/commands/hset/>
#[derive(Debug, PartialEq)]
pub struct HSet {
    pub key: String,
    pub fields: Vec<(Bytes, Bytes)>,
}

impl Executable for HSet {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let mut store = ctx.store().lock();

        let mut added = 0;
        for (field, value) in self.fields {
            if store.hset(&self.key, field, value)? {
                added += 1;
            }
        }

        Ok(Frame::Integer(added).into())
    }
}

impl TryFrom<&mut CommandParser> for HSet {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;

        let mut parts = vec![];
        while parser.has_remaining() {
            parts.push(parser.next_bytes()?);
        }
        if parts.is_empty() || parts.len() % 2 != 0 {
            return Err(Error::wrong_number_of_arguments(parser.command_name()));
        }

        let fields = parts.into_iter().tuples().collect();
        Ok(Self { key, fields })
    }
}
