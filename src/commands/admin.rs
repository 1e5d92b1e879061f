//! Admin commands (QUIT)

use super::{Command, CommandContext};
use crate::protocol::Response;
use tracing::info;

/// QUIT command - Stop the whole server
///
/// Syntax: QUIT
///
/// Cancels the server-wide shutdown token. The event loop notices at the end
/// of the current iteration and closes every connection, including this one.
/// Nothing is written back.
pub struct QuitCommand;

impl Command for QuitCommand {
    fn execute(&self, ctx: &mut CommandContext, _args: &[&[u8]]) -> Response {
        info!("QUIT received, shutting down");
        ctx.shutdown.cancel();
        Response::NoReply
    }

    fn name(&self) -> &'static str {
        "QUIT"
    }

    fn min_len(&self) -> usize {
        4
    }

    fn arity(&self) -> usize {
        0
    }

    fn matches(&self, line: &[u8]) -> bool {
        line == self.name().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_quit_cancels_token() {
        let token = CancellationToken::new();
        let mut ctx = CommandContext::new(token.clone()).unwrap();

        let result = QuitCommand.execute(&mut ctx, &[]);
        assert_eq!(result, Response::NoReply);
        assert!(token.is_cancelled());
    }
}
