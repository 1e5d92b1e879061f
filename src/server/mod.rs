//! Server module
//!
//! Owns the listening socket and runs the event loop on a single thread.
//! One iteration is one readiness wait: either a new connection is accepted,
//! or every readable client gets exactly one read and one response. Clients
//! that hit EOF or an error are closed immediately but only removed from the
//! registry once the iteration is over. The shutdown token is checked at the
//! end of each iteration.

mod connection;
mod registry;

pub use connection::{Connection, ConnectionId, ConnectionState, ReadOutcome};
pub use registry::ConnectionRegistry;

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::store::StoreError;
use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Fatal server errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// Socket creation, bind or listen failed
    #[error("{stage} failed: {source}")]
    Startup {
        stage: &'static str,
        #[source]
        source: io::Error,
    },

    /// Waiting for readiness failed for a reason other than interruption
    #[error("readiness wait failed: {0}")]
    Readiness(#[source] io::Error),

    /// A table could not be allocated
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What woke up the readiness wait
enum Readiness {
    /// The listener had a pending connection
    Incoming(io::Result<(TcpStream, SocketAddr)>),

    /// At least one client is readable
    Clients,

    /// Tick elapsed or shutdown requested
    Idle,

    /// The wait was interrupted
    Interrupted,
}

/// Create the listening socket
///
/// IPv4, address reuse enabled, explicit backlog. Must be called from within
/// a tokio runtime.
pub fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let socket =
        Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).map_err(startup("socket"))?;
    socket.set_reuse_address(true).map_err(startup("setsockopt"))?;
    socket
        .bind(&SockAddr::from(config.addr()))
        .map_err(startup("bind"))?;
    socket.listen(config.backlog).map_err(startup("listen"))?;
    socket.set_nonblocking(true).map_err(startup("set_nonblocking"))?;

    TcpListener::from_std(socket.into()).map_err(startup("register"))
}

fn startup(stage: &'static str) -> impl FnOnce(io::Error) -> ServerError {
    move |source| ServerError::Startup { stage, source }
}

/// Run the server until the shutdown token is cancelled
///
/// The token is cancelled by QUIT and may also be cancelled by the caller.
pub async fn run(
    listener: TcpListener,
    config: &ServerConfig,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    Server::new(listener, config, shutdown)?.run().await
}

/// Event loop state
pub struct Server {
    /// Live connections
    registry: ConnectionRegistry,

    /// Protocol engine, owns the database
    dispatcher: Dispatcher,

    /// Listening socket
    listener: TcpListener,

    /// Cooperative shutdown flag
    shutdown: CancellationToken,

    /// Readiness wait ceiling
    tick: Duration,
}

impl Server {
    /// Create the registry and database around a bound listener
    pub fn new(
        listener: TcpListener,
        config: &ServerConfig,
        shutdown: CancellationToken,
    ) -> Result<Self, ServerError> {
        Ok(Server {
            registry: ConnectionRegistry::new()?,
            dispatcher: Dispatcher::new(shutdown.clone())?,
            listener,
            shutdown,
            tick: config.tick(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the event loop, then close everything
    pub async fn run(mut self) -> Result<(), ServerError> {
        if let Ok(addr) = self.local_addr() {
            info!("Listening on {}", addr);
        }

        let result = self.event_loop().await;
        if let Err(e) = &result {
            error!("Event loop stopped: {}", e);
        }

        let closed = self.registry.close_all();
        info!("Closed {} connections", closed);

        // Release the registry and database, then the listening socket
        let Server {
            registry,
            dispatcher,
            listener,
            ..
        } = self;
        drop(registry);
        drop(dispatcher);
        drop(listener);

        result
    }

    async fn event_loop(&mut self) -> Result<(), ServerError> {
        let mut closed: Vec<Bytes> = Vec::new();

        loop {
            match self.wait_ready().await? {
                Readiness::Incoming(accepted) => self.accept(accepted),
                Readiness::Clients => self.serve_ready(&mut closed).await,
                Readiness::Idle => debug!("Tick with {} connections", self.registry.len()),
                Readiness::Interrupted => {
                    info!("Readiness wait interrupted");
                    return Ok(());
                }
            }

            self.remove_closed(&mut closed);

            if self.shutdown.is_cancelled() {
                info!("Shutdown requested");
                return Ok(());
            }
        }
    }

    /// Deferred deregistration, sockets are already closed
    fn remove_closed(&mut self, closed: &mut Vec<Bytes>) {
        for key in closed.drain(..) {
            if self.registry.deregister(&key) {
                debug!("Deregistered connection {}", String::from_utf8_lossy(&key));
            }
        }
    }

    /// Block until the listener or any open client is ready, the tick
    /// elapses, or shutdown is requested
    async fn wait_ready(&self) -> Result<Readiness, ServerError> {
        let mut readable: FuturesUnordered<_> = self
            .registry
            .active()
            .map(|connection| connection.readable())
            .collect();

        let any_client = async move {
            match readable.next().await {
                Some(result) => result,
                None => std::future::pending::<io::Result<()>>().await,
            }
        };

        let readiness = tokio::select! {
            biased;

            accepted = self.listener.accept() => Readiness::Incoming(accepted),
            ready = any_client => match ready {
                Ok(()) => Readiness::Clients,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => Readiness::Interrupted,
                Err(e) => return Err(ServerError::Readiness(e)),
            },
            _ = self.shutdown.cancelled() => Readiness::Idle,
            _ = tokio::time::sleep(self.tick) => Readiness::Idle,
        };

        Ok(readiness)
    }

    /// Register one accepted connection
    fn accept(&mut self, accepted: io::Result<(TcpStream, SocketAddr)>) {
        let (stream, peer) = match accepted {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Accept failed: {}", e);
                return;
            }
        };

        let connection = Connection::new(stream, peer);
        let id = connection.id();
        match self.registry.register(connection) {
            Ok(()) => info!("New connection {} from {}", id, peer),
            Err(e) => error!("Dropping connection from {}: {}", peer, e),
        }
    }

    /// Give every readable client one read and one response
    ///
    /// Keys of connections closed here are pushed to `closed`; the registry
    /// itself is not modified while it is being walked.
    async fn serve_ready(&mut self, closed: &mut Vec<Bytes>) {
        for (key, connection) in self.registry.iter_mut() {
            let line = match connection.try_read_line() {
                ReadOutcome::Line(line) => line,
                ReadOutcome::NotReady => continue,
                ReadOutcome::Eof => {
                    info!("Connection closed: {}", connection.peer());
                    connection.close();
                    closed.push(key.clone());
                    continue;
                }
                ReadOutcome::Failed(e) => {
                    warn!("Read from {} failed: {}", connection.peer(), e);
                    connection.close();
                    closed.push(key.clone());
                    continue;
                }
            };

            debug!("Request from {}: {:?}", connection.peer(), String::from_utf8_lossy(&line));

            let response = self.dispatcher.dispatch(&line);

            debug!("Response: {}", response);

            if let Err(e) = connection.send_response(&response).await {
                warn!("Write to {} failed: {}", connection.peer(), e);
                connection.close();
                closed.push(key.clone());
            }
        }
    }
}
