use std::fmt;

use tracing::error;

use crate::error::{
    MEMBER_DEPARTED, PARSING_EXCEPTION_MESSAGE, SERVER_ERROR_MESSAGE, SERVER_ERROR_SHUTDOWN,
};
use crate::frame::Frame;
use crate::Error;

/// Maps a failure onto the error reply sent to the client.
///
/// `Execution` wrappers are peeled down to their innermost cause first. Failures without
/// a client facing category are logged with `connection` and answered with a generic
/// server error.
pub fn classify(cause: &Error, connection: &impl fmt::Display) -> Frame {
    match cause.initial_cause() {
        Error::InvalidArgument(message)
        | Error::Arithmetic(message)
        | Error::InvalidState(message)
        | Error::ParameterMismatch(message) => Frame::error(message),
        Error::WrongType(message) => Frame::wrong_type(message),
        Error::Decode(_) | Error::Protocol(_) => Frame::error(PARSING_EXCEPTION_MESSAGE),
        Error::ShuttingDown => Frame::error(SERVER_ERROR_SHUTDOWN),
        Error::MemberDeparted(message) if message.contains(MEMBER_DEPARTED) => {
            Frame::error(message)
        }
        Error::MemberDeparted(message) => {
            Frame::error(format!("{}: {}", MEMBER_DEPARTED, message))
        }
        other => {
            error!(connection_id = %connection, "{}", other);
            Frame::error(SERVER_ERROR_MESSAGE)
        }
    }
}
