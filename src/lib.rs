//! tcpkv - A single-threaded in-memory key-value store
//!
//! Clients speak a newline-delimited text protocol (GET, SET, DEL, INCR,
//! QUIT) over TCP. One thread multiplexes every connection:
//! - `store` is the open-addressed table behind both the database and the
//!   connection registry
//! - `protocol` frames and tokenizes lines and encodes responses
//! - `commands` and `dispatch` form the protocol engine
//! - `server` owns the sockets and the event loop

pub mod config;
pub mod protocol;
pub mod store;
pub mod commands;
pub mod dispatch;
pub mod server;

/// Re-export commonly used types
pub use config::ServerConfig;
pub use dispatch::Dispatcher;
pub use protocol::{ProtocolError, Response};
pub use server::{Server, ServerError};
pub use store::{StoreError, Table};
