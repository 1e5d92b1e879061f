//! Command dispatcher
//!
//! Routes request lines to the appropriate handler.
//! This module provides loose coupling between the server and command implementations.

use crate::commands::{CommandContext, CommandRegistry};
use crate::protocol::{LineParser, ProtocolError, Response};
use crate::store::StoreError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Command dispatcher
///
/// Receives request lines, validates them, and routes to appropriate handlers
pub struct Dispatcher {
    /// Command registry
    registry: CommandRegistry,

    /// Command execution context
    context: CommandContext,
}

impl Dispatcher {
    /// Create a new dispatcher with an empty database
    pub fn new(shutdown: CancellationToken) -> Result<Self, StoreError> {
        Ok(Dispatcher {
            registry: CommandRegistry::new(),
            context: CommandContext::new(shutdown)?,
        })
    }

    /// Dispatch a request line
    ///
    /// The line must already be stripped of its newline. Protocol and value
    /// errors come back as ordinary responses.
    pub fn dispatch(&mut self, line: &[u8]) -> Response {
        // Look up the command
        let command = match self.registry.resolve(line) {
            Some(cmd) => cmd,
            None => {
                warn!("Unknown command: {:?}", String::from_utf8_lossy(line));
                return ProtocolError::UnknownCommand.into();
            }
        };

        // The command token always comes first, arguments follow
        let tokens = LineParser::tokenize(line);
        let args = &tokens[1..];

        // Validate argument count
        if args.len() < command.arity() {
            warn!("Missing argument for {}", command.name());
            return ProtocolError::MissingArgument.into();
        }

        debug!("Dispatching command: {}", command.name());

        // Execute the command
        command.execute(&mut self.context, args)
    }

    /// Get reference to the context (for testing/inspection)
    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    /// Get mutable reference to the context (for testing/inspection)
    pub fn context_mut(&mut self) -> &mut CommandContext {
        &mut self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(CancellationToken::new()).unwrap()
    }

    #[test]
    fn test_dispatch_set_get_incr_del() {
        let mut dispatcher = dispatcher();

        assert_eq!(dispatcher.dispatch(b"SET a 1"), Response::Ok);
        assert_eq!(dispatcher.dispatch(b"GET a"), Response::value(Bytes::from("1")));
        assert_eq!(dispatcher.dispatch(b"INCR a"), Response::integer(2));
        assert_eq!(dispatcher.dispatch(b"DEL a"), Response::integer(1));
        assert_eq!(dispatcher.dispatch(b"GET a"), Response::Nil);
        assert_eq!(dispatcher.dispatch(b"DEL a"), Response::integer(0));
    }

    #[test]
    fn test_dispatch_incr_missing() {
        let mut dispatcher = dispatcher();

        assert_eq!(dispatcher.dispatch(b"INCR missing"), Response::integer(1));
        assert_eq!(
            dispatcher.dispatch(b"GET missing"),
            Response::value(Bytes::from("1"))
        );
    }

    #[test]
    fn test_dispatch_incr_non_numeric() {
        let mut dispatcher = dispatcher();

        dispatcher.dispatch(b"SET b abc");
        assert_eq!(
            dispatcher.dispatch(b"INCR b"),
            Response::error("ERR value is not an integer or out of range")
        );
        assert_eq!(dispatcher.dispatch(b"GET b"), Response::value(Bytes::from("abc")));
    }

    #[test]
    fn test_dispatch_unknown_command() {
        let mut dispatcher = dispatcher();
        let unknown = Response::error("Unknown command");

        assert_eq!(dispatcher.dispatch(b"FOO"), unknown);
        assert_eq!(dispatcher.dispatch(b""), unknown);
        assert_eq!(dispatcher.dispatch(b"GET"), unknown);
        assert_eq!(dispatcher.dispatch(b"set a b"), unknown);
    }

    #[test]
    fn test_dispatch_missing_arguments() {
        let mut dispatcher = dispatcher();
        let unknown = Response::error("Unknown command");

        assert_eq!(dispatcher.dispatch(b"GET "), unknown);
        assert_eq!(dispatcher.dispatch(b"SET a"), unknown);
        assert!(dispatcher.context().db.is_empty());
    }

    #[test]
    fn test_dispatch_extra_tokens_ignored() {
        let mut dispatcher = dispatcher();

        assert_eq!(dispatcher.dispatch(b"SET a hello world"), Response::Ok);
        assert_eq!(dispatcher.dispatch(b"GET a"), Response::value(Bytes::from("hello")));
    }

    #[test]
    fn test_dispatch_quit() {
        let token = CancellationToken::new();
        let mut dispatcher = Dispatcher::new(token.clone()).unwrap();

        assert_eq!(dispatcher.dispatch(b"QUIT now"), Response::error("Unknown command"));
        assert!(!token.is_cancelled());

        assert_eq!(dispatcher.dispatch(b"QUIT"), Response::NoReply);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_context_mut() {
        let mut dispatcher = dispatcher();
        dispatcher
            .context_mut()
            .db
            .set("seeded", Bytes::from("7"))
            .unwrap();

        assert_eq!(dispatcher.dispatch(b"INCR seeded"), Response::integer(8));
    }
}
