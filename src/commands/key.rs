//! Key commands (DEL)

use super::{Command, CommandContext};
use crate::protocol::Response;

/// DEL command - Delete a key
///
/// Syntax: DEL key
pub struct DelCommand;

impl Command for DelCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[&[u8]]) -> Response {
        let deleted = ctx.db.delete(args[0]);
        Response::integer(i64::from(deleted))
    }

    fn name(&self) -> &'static str {
        "DEL"
    }
}
