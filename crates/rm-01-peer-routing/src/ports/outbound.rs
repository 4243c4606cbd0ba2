//! # Driven Ports (Outbound SPI)
//!
//! The datagram transport the host application provides.

use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;

/// Sends encoded packets to a peer endpoint.
///
/// Sending never waits: a datagram the socket cannot take right now is
/// reported as [`NetworkError::WouldBlock`] and the caller drops it.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; every subsystem sends through the
/// same shared socket.
pub trait GossipTransport: Send + Sync {
    /// Send one datagram.
    fn send_datagram(&self, bytes: &[u8], target: SocketAddr) -> Result<(), NetworkError>;

    /// The endpoint peers see as our address.
    fn local_addr(&self) -> SocketAddr;
}

/// Receives datagrams for the dispatcher loop.
#[async_trait]
pub trait DatagramSource: Send {
    /// Wait for the next datagram and its sender.
    async fn recv_datagram(&mut self) -> Result<(Vec<u8>, SocketAddr), NetworkError>;
}

/// Errors from network operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The socket could not be bound.
    #[error("cannot bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    /// The socket buffer is full.
    #[error("socket would block")]
    WouldBlock,

    /// The datagram exceeds the configured packet size.
    #[error("datagram of {size} bytes exceeds {limit}")]
    MessageTooLarge { size: usize, limit: usize },

    /// No endpoint is listening at the target (in-memory transport only).
    #[error("unreachable endpoint {0}")]
    Unreachable(SocketAddr),

    /// The receive side was closed.
    #[error("transport closed")]
    Closed,

    /// Any other socket error.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for NetworkError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::WouldBlock => NetworkError::WouldBlock,
            _ => NetworkError::Io(error.to_string()),
        }
    }
}
