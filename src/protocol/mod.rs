//! Line protocol implementation
//!
//! Newline-delimited ASCII requests and responses, one line each way.
//! This module only frames and tokenizes; it never touches the store.

mod types;
mod line;

pub use types::{Response, ProtocolError};
pub use line::{LineParser, LineEncoder, MAX_LINE};
