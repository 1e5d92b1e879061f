//! Counter commands (INCR)

use super::{owned_arg, parse_integer, Command, CommandContext};
use crate::protocol::{ProtocolError, Response};
use bytes::Bytes;
use tracing::error;

/// INCR command - Increment the integer value of a key by 1
///
/// Syntax: INCR key
///
/// A missing key counts as "0". The value is stored back as decimal text.
/// A value that does not parse, or would overflow, is left untouched.
pub struct IncrCommand;

impl Command for IncrCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[&[u8]]) -> Response {
        let key = args[0];

        let new_value = match ctx.db.get_mut(key) {
            Some(value) => {
                let incremented = parse_integer(value)
                    .and_then(|i| i.checked_add(1).ok_or(ProtocolError::NotAnInteger));
                let i = match incremented {
                    Ok(i) => i,
                    Err(e) => return e.into(),
                };
                *value = Bytes::from(i.to_string());
                i
            }
            None => {
                // Key doesn't exist, initialize to 1
                if let Err(e) = ctx.db.set(owned_arg(key), Bytes::from_static(b"1")) {
                    error!("INCR aborted: {}", e);
                    return ProtocolError::OutOfMemory.into();
                }
                1
            }
        };

        Response::integer(new_value)
    }

    fn name(&self) -> &'static str {
        "INCR"
    }
}
