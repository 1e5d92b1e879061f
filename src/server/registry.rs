//! Registry of live connections
//!
//! A table keyed by the textual descriptor number. The event loop reads it to
//! build each readiness set and only removes entries between iterations.

use super::connection::Connection;
use crate::store::{IterMut, StoreError, Table};

/// Live connections keyed by descriptor number
pub struct ConnectionRegistry {
    table: Table<Connection>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Result<Self, StoreError> {
        Ok(ConnectionRegistry {
            table: Table::new()?,
        })
    }

    /// Register an accepted connection
    ///
    /// On failure the connection is dropped, which closes its socket.
    pub fn register(&mut self, connection: Connection) -> Result<(), StoreError> {
        let key = connection.key();
        self.table.set(key, connection).map(|_| ())
    }

    /// Remove a connection, returns true if it was registered
    pub fn deregister(&mut self, key: &[u8]) -> bool {
        self.table.delete(key)
    }

    /// Number of registered connections, including ones pending close
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Connections whose socket is still open
    pub fn active(&self) -> impl Iterator<Item = &Connection> {
        self.table
            .iter()
            .map(|(_, connection)| connection)
            .filter(|connection| connection.is_active())
    }

    /// Iterate registry keys with mutable connections
    pub fn iter_mut(&mut self) -> IterMut<'_, Connection> {
        self.table.iter_mut()
    }

    /// Close every open socket, returns how many were open
    pub fn close_all(&mut self) -> usize {
        let mut closed = 0;
        for (_, connection) in self.table.iter_mut() {
            if connection.close() {
                closed += 1;
            }
        }
        closed
    }
}
