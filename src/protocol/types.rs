//! Response and error types for the line protocol

use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// A reply to one request line
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// OK\n
    Ok,

    /// The stored value followed by a newline
    Value(Bytes),

    /// An empty line, for a missing key
    Nil,

    /// A decimal integer: 1\n
    Integer(i64),

    /// A literal error line such as `Unknown command`
    Error(String),

    /// Nothing is written back
    NoReply,
}

impl Response {
    /// Create a value response
    pub fn value(b: impl Into<Bytes>) -> Self {
        Response::Value(b.into())
    }

    /// Create an error response
    pub fn error(s: impl Into<String>) -> Self {
        Response::Error(s.into())
    }

    /// Create an integer response
    pub fn integer(i: i64) -> Self {
        Response::Integer(i)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok => write!(f, "Ok"),
            Response::Value(b) => write!(f, "Value({} bytes)", b.len()),
            Response::Nil => write!(f, "Nil"),
            Response::Integer(i) => write!(f, "Integer({})", i),
            Response::Error(e) => write!(f, "Error({})", e),
            Response::NoReply => write!(f, "NoReply"),
        }
    }
}

/// Request failures that are answered on the connection
///
/// The display text of each variant is exactly what the client receives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// No command matches the line
    #[error("Unknown command")]
    UnknownCommand,

    /// A command matched but an argument is missing
    #[error("Unknown command")]
    MissingArgument,

    /// The stored value does not parse as a signed 64-bit integer
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    /// The database could not grow to take the new key
    #[error("ERR out of memory")]
    OutOfMemory,
}

impl From<ProtocolError> for Response {
    fn from(err: ProtocolError) -> Self {
        Response::error(err.to_string())
    }
}
