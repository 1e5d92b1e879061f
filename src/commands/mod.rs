//! Command execution module
//!
//! Provides a unified interface for all commands through the Command trait.
//! Each command is implemented in a separate file for high cohesion.

mod context;
mod registry;

// Command implementations
mod string;
mod key;
mod counter;
mod admin;

pub use context::CommandContext;
pub use registry::CommandRegistry;

use crate::protocol::{ProtocolError, Response};
use bytes::Bytes;

/// Command execution trait
///
/// All commands implement this trait with a single execute method.
/// This provides loose coupling between command implementations and the dispatcher.
pub trait Command: Send + Sync {
    /// Execute the command with the given context and arguments
    ///
    /// Arguments:
    /// - ctx: mutable reference to the command context (contains the database)
    /// - args: tokens after the command token, at least `arity()` of them
    ///
    /// Returns:
    /// - Response to send to the client
    fn execute(&self, ctx: &mut CommandContext, args: &[&[u8]]) -> Response;

    /// Get the command name, also the literal prefix a line must start with
    fn name(&self) -> &'static str;

    /// Shortest line that may match this command
    fn min_len(&self) -> usize {
        self.name().len() + 1
    }

    /// Number of required arguments
    fn arity(&self) -> usize {
        1
    }

    /// Check if a request line selects this command (case-sensitive)
    fn matches(&self, line: &[u8]) -> bool {
        line.len() >= self.min_len() && line.starts_with(self.name().as_bytes())
    }
}

/// Copy an argument token into owned storage
pub(crate) fn owned_arg(token: &[u8]) -> Bytes {
    Bytes::copy_from_slice(token)
}

/// Parse a stored value as a base-10 signed integer
pub(crate) fn parse_integer(value: &[u8]) -> Result<i64, ProtocolError> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(ProtocolError::NotAnInteger)
}
