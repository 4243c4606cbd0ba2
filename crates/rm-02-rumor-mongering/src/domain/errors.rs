use rm_01_peer_routing::RoutingError;
use thiserror::Error;

/// Errors surfaced by the rumor engine to its callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RumorError {
    /// There is no neighbor to gossip with.
    #[error("no neighbor to send to")]
    NoNeighbor,

    /// A private message needs a destination.
    #[error("private message has no destination")]
    MissingDestination,

    /// The relay address of a simple message is not an endpoint.
    #[error("invalid relay address `{0}`")]
    InvalidRelay(String),

    /// Routing refused the message.
    #[error(transparent)]
    Routing(#[from] RoutingError),
}

pub type Result<T> = std::result::Result<T, RumorError>;
