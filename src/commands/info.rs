use bytes::Bytes;

use crate::commands::executable::{Executable, Reply};
use crate::commands::CommandParser;
use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// Returns information and statistics about the server. Sections are not filtered.
///
/// Ref: <https://redis.io/docs/latest/commands/info/>
#[derive(Debug, PartialEq)]
pub struct Info {
    pub sections: Vec<String>,
}

impl Executable for Info {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error> {
        let mut info = ctx.stats().report();
        let keys = ctx.store().lock().size();

        info.push_str(&format!("\r\n# Keyspace\r\ndb0:keys={}\r\n", keys));

        Ok(Frame::Bulk(Bytes::from(info)).into())
    }
}

impl TryFrom<&mut CommandParser> for Info {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut sections = vec![];
        while parser.has_remaining() {
            sections.push(parser.next_string()?.to_lowercase());
        }

        Ok(Self { sections })
    }
}
