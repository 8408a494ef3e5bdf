use thiserror::Error as ThisError;

use crate::commands::CommandParserError;
use crate::frame;

pub const ERROR_NOT_AUTH: &str = "NOAUTH Authentication required.";
pub const PARSING_EXCEPTION_MESSAGE: &str =
    "The command received by the server was improperly formatted";
pub const SERVER_ERROR_SHUTDOWN: &str = "The server is shutting down";
pub const SERVER_ERROR_MESSAGE: &str = "The server had an internal error please try again";
pub const ERROR_UNSUPPORTED_COMMAND: &str = " is not supported. To enable all unsupported \
     commands restart with '--enable-unsupported-commands' or run \
     'CONFIG SET enable-unsupported-commands yes'. Unsupported commands have not been fully tested.";
pub const ERROR_UNIMPLEMENTED_COMMAND: &str = " is not implemented.";
pub const ERROR_WRONG_TYPE: &str = "Operation against a key holding the wrong kind of value";
pub const ERROR_NOT_INTEGER: &str = "value is not an integer or out of range";
pub const ERROR_NOT_FLOAT: &str = "value is not a valid float";
pub const ERROR_OVERFLOW: &str = "increment or decrement would overflow";
pub const ERROR_SYNTAX: &str = "syntax error";
pub const MEMBER_DEPARTED: &str = "memberDeparted";

/// Every failure a command, the codec or the transport can produce.
///
/// The variants are the categories the classifier maps onto wire errors, so
/// new failure sources should pick the variant whose reply they want rather
/// than adding a new one.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Malformed numeric or otherwise unparseable argument.
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Arithmetic(String),
    /// The operation was applied to a value of a different data shape.
    #[error("{0}")]
    WrongType(String),
    /// A frame decoded fine but could not be turned into a command.
    #[error("protocol error; {0}")]
    Decode(#[from] CommandParserError),
    #[error("{}", SERVER_ERROR_SHUTDOWN)]
    ShuttingDown,
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    ParameterMismatch(String),
    /// The backend member that owned the work went away mid-execution.
    #[error("{0}")]
    MemberDeparted(String),
    /// A backend execution fault carrying the failure that caused it.
    #[error("backend execution failed: {0}")]
    Execution(#[source] Box<Error>),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocol error; {0}")]
    Protocol(#[from] frame::Error),
    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub fn wrong_number_of_arguments(command: &str) -> Error {
        Error::ParameterMismatch(format!(
            "wrong number of arguments for '{}' command",
            command.to_lowercase()
        ))
    }

    pub fn not_an_integer() -> Error {
        Error::InvalidArgument(ERROR_NOT_INTEGER.to_string())
    }

    pub fn wrong_type() -> Error {
        Error::WrongType(ERROR_WRONG_TYPE.to_string())
    }

    pub fn syntax() -> Error {
        Error::ParameterMismatch(ERROR_SYNTAX.to_string())
    }

    /// Wraps `self` as the cause of a backend execution fault.
    pub fn in_execution(self) -> Error {
        Error::Execution(Box::new(self))
    }

    /// Follows `Execution` wrappers down to the failure that started the chain.
    pub fn initial_cause(&self) -> &Error {
        let mut cause = self;
        while let Error::Execution(inner) = cause {
            cause = inner;
        }
        cause
    }
}
