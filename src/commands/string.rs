//! String commands (GET, SET)

use super::{owned_arg, Command, CommandContext};
use crate::protocol::{ProtocolError, Response};
use tracing::error;

/// GET command - Get the value of a key
///
/// Syntax: GET key
pub struct GetCommand;

impl Command for GetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[&[u8]]) -> Response {
        match ctx.db.get(args[0]) {
            Some(value) => Response::value(value.clone()),
            None => Response::Nil,
        }
    }

    fn name(&self) -> &'static str {
        "GET"
    }
}

/// SET command - Set a key to a value
///
/// Syntax: SET key value
///
/// The value is a single token, values containing spaces are not supported.
pub struct SetCommand;

impl Command for SetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[&[u8]]) -> Response {
        match ctx.db.set(owned_arg(args[0]), owned_arg(args[1])) {
            Ok(_) => Response::Ok,
            Err(e) => {
                error!("SET aborted: {}", e);
                ProtocolError::OutOfMemory.into()
            }
        }
    }

    fn name(&self) -> &'static str {
        "SET"
    }

    fn arity(&self) -> usize {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio_util::sync::CancellationToken;

    fn context() -> CommandContext {
        CommandContext::new(CancellationToken::new()).unwrap()
    }

    #[test]
    fn test_set_get() {
        let mut ctx = context();

        let result = SetCommand.execute(&mut ctx, &[b"mykey", b"myvalue"]);
        assert_eq!(result, Response::Ok);

        let result = GetCommand.execute(&mut ctx, &[b"mykey"]);
        assert_eq!(result, Response::value(Bytes::from("myvalue")));
    }

    #[test]
    fn test_set_overwrites() {
        let mut ctx = context();
        SetCommand.execute(&mut ctx, &[b"k", b"first"]);
        SetCommand.execute(&mut ctx, &[b"k", b"second"]);

        assert_eq!(ctx.db.len(), 1);
        assert_eq!(ctx.db.get(b"k"), Some(&Bytes::from("second")));
    }

    #[test]
    fn test_get_nonexistent() {
        let mut ctx = context();

        let result = GetCommand.execute(&mut ctx, &[b"nonexistent"]);
        assert_eq!(result, Response::Nil);
    }
}
