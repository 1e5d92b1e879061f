//! Connection handling
//!
//! A connection is Active while it owns its socket. Closing drops the socket
//! right away and leaves the connection PendingClose until the event loop
//! removes it from the registry.

use crate::protocol::{LineEncoder, LineParser, Response, MAX_LINE};
use bytes::{Bytes, BytesMut};
use std::io;
use std::net::SocketAddr;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// Descriptor number of a connection's socket
pub type ConnectionId = u64;

/// Lifecycle of a registered connection
#[derive(Debug)]
pub enum ConnectionState {
    /// Socket open and watched for readability
    Active(TcpStream),

    /// Socket closed, registry entry not yet removed
    PendingClose,
}

/// Result of one bounded read
#[derive(Debug)]
pub enum ReadOutcome {
    /// A request line, newline stripped
    Line(Bytes),

    /// Nothing to read right now
    NotReady,

    /// The peer closed its end
    Eof,

    /// The read failed
    Failed(io::Error),
}

/// Connection handler
#[derive(Debug)]
pub struct Connection {
    /// Descriptor number, also the registry key in text form
    id: ConnectionId,

    /// Remote address
    peer: SocketAddr,

    /// Socket or closed marker
    state: ConnectionState,

    /// Write buffer
    write_buffer: BytesMut,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Connection {
            id: descriptor(&stream),
            peer,
            state: ConnectionState::Active(stream),
            write_buffer: BytesMut::with_capacity(MAX_LINE + 1),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Registry key: the descriptor number as decimal text
    pub fn key(&self) -> Bytes {
        Bytes::from(self.id.to_string())
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, ConnectionState::Active(_))
    }

    /// Wait until the socket is readable
    ///
    /// Never resolves for a closed connection.
    pub async fn readable(&self) -> io::Result<()> {
        match &self.state {
            ConnectionState::Active(stream) => stream.readable().await,
            ConnectionState::PendingClose => std::future::pending::<io::Result<()>>().await,
        }
    }

    /// Perform one non-blocking read of at most `MAX_LINE` bytes
    ///
    /// Only the first line of what arrived is kept. Partial lines are not
    /// reassembled across reads.
    pub fn try_read_line(&mut self) -> ReadOutcome {
        let ConnectionState::Active(stream) = &self.state else {
            return ReadOutcome::NotReady;
        };

        let mut buf = [0u8; MAX_LINE];
        match stream.try_read(&mut buf) {
            Ok(0) => ReadOutcome::Eof,
            Ok(n) => ReadOutcome::Line(Bytes::copy_from_slice(LineParser::extract_line(&buf[..n]))),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => ReadOutcome::NotReady,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => ReadOutcome::NotReady,
            Err(e) => ReadOutcome::Failed(e),
        }
    }

    /// Send a response to the client
    ///
    /// Short writes are retried until the whole line is out. A peer that
    /// stops reading will eventually fill its send buffer, and this call then
    /// holds up the event loop (every other client and shutdown included)
    /// until the peer drains it or the connection fails.
    pub async fn send_response(&mut self, response: &Response) -> io::Result<()> {
        // Encode the response
        self.write_buffer.clear();
        LineEncoder::encode_to(&mut self.write_buffer, response);
        if self.write_buffer.is_empty() {
            return Ok(());
        }

        // Write to the socket
        match &mut self.state {
            ConnectionState::Active(stream) => {
                stream.write_all(&self.write_buffer).await?;
                stream.flush().await
            }
            ConnectionState::PendingClose => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection already closed",
            )),
        }
    }

    /// Close the socket, returns true if it was still open
    pub fn close(&mut self) -> bool {
        matches!(
            std::mem::replace(&mut self.state, ConnectionState::PendingClose),
            ConnectionState::Active(_)
        )
    }
}

#[cfg(unix)]
fn descriptor(stream: &TcpStream) -> ConnectionId {
    use std::os::fd::AsRawFd;
    stream.as_raw_fd() as ConnectionId
}

#[cfg(windows)]
fn descriptor(stream: &TcpStream) -> ConnectionId {
    use std::os::windows::io::AsRawSocket;
    stream.as_raw_socket()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn pair() -> (Connection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();
        (Connection::new(stream, peer), client)
    }

    #[tokio::test]
    async fn test_read_line_and_respond() {
        let (mut connection, mut client) = pair().await;
        assert_eq!(connection.key(), Bytes::from(connection.id().to_string()));

        client.write_all(b"GET a\r\n").await.unwrap();
        connection.readable().await.unwrap();
        match connection.try_read_line() {
            ReadOutcome::Line(line) => assert_eq!(&line[..], b"GET a"),
            other => panic!("unexpected outcome: {:?}", other),
        }

        connection.send_response(&Response::Ok).await.unwrap();
        let mut reply = [0u8; 3];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(&reply, b"OK\n");
    }

    #[tokio::test]
    async fn test_read_is_bounded() {
        let (mut connection, mut client) = pair().await;

        let long = vec![b'x'; 200];
        client.write_all(&long).await.unwrap();
        connection.readable().await.unwrap();
        match connection.try_read_line() {
            ReadOutcome::Line(line) => assert_eq!(line.len(), MAX_LINE),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_eof_and_close() {
        let (mut connection, client) = pair().await;
        drop(client);

        connection.readable().await.unwrap();
        assert!(matches!(connection.try_read_line(), ReadOutcome::Eof));

        assert!(connection.close());
        assert!(!connection.is_active());
        assert!(!connection.close());
        assert!(matches!(connection.try_read_line(), ReadOutcome::NotReady));
        assert!(connection.send_response(&Response::Ok).await.is_err());
    }

    #[tokio::test]
    async fn test_no_reply_writes_nothing() {
        let (mut connection, _client) = pair().await;
        connection.send_response(&Response::NoReply).await.unwrap();
    }
}
