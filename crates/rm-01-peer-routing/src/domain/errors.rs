use std::net::SocketAddr;

use thiserror::Error;

/// Why a routed message was not sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The hop limit reached zero.
    #[error("hop limit exhausted for destination {0}")]
    HopLimitExhausted(String),

    /// No next hop is known for the destination.
    #[error("no route to {0}")]
    NoRoute(String),

    /// The packet could not be encoded.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The transport refused the datagram.
    #[error("send to {target} failed: {reason}")]
    Send { target: SocketAddr, reason: String },
}
