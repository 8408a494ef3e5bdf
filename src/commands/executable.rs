use crate::context::ExecutionContext;
use crate::frame::Frame;
use crate::Error;

/// What running a command produced.
#[derive(Debug, PartialEq)]
pub enum Reply {
    /// The response, ready to be written.
    Frame(Frame),
    /// The body was handed to the worker pool, which reports the response on completion.
    Deferred,
}

impl From<Frame> for Reply {
    fn from(frame: Frame) -> Self {
        Reply::Frame(frame)
    }
}

pub trait Executable {
    fn exec(self, ctx: &ExecutionContext) -> Result<Reply, Error>;
}
