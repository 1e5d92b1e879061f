//! Command execution context

use crate::store::{StoreError, Table};
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

/// Context provided to commands during execution
///
/// Gives commands the database and the server-wide shutdown token.
pub struct CommandContext {
    /// The database
    pub db: Table<Bytes>,

    /// Cancelled to stop the event loop
    pub shutdown: CancellationToken,
}

impl CommandContext {
    /// Create a new command context with an empty database
    pub fn new(shutdown: CancellationToken) -> Result<Self, StoreError> {
        Ok(CommandContext {
            db: Table::new()?,
            shutdown,
        })
    }
}
