use rm_01_peer_routing::RoutingError;
use thiserror::Error;

/// File subsystem errors. Programmer errors (illegal state transitions)
/// panic instead.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no file named `{0}`")]
    NotFound(String),

    /// Names are plain file names, never paths.
    #[error("invalid file name `{0}`")]
    InvalidName(String),

    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    /// A file with this metahash is already in the index.
    #[error("metahash {0} is already indexed")]
    AlreadyIndexed(String),

    #[error("unknown metahash {0}")]
    UnknownFile(String),

    /// The file is not a complete search match yet.
    #[error("file {0} is not available for download")]
    NotAvailable(String),

    /// A metafile must be a whole number of hashes, at most one chunk long.
    #[error("metafile of {0} bytes is malformed")]
    InvalidMetafile(usize),

    /// No source is known for a chunk.
    #[error("no source for chunk {index} of {name}")]
    NoChunkSource { name: String, index: u64 },

    /// A request for this hash is already outstanding.
    #[error("request for {0} already pending")]
    AlreadyPending(String),

    #[error("no reply from {peer} for {hash}")]
    Timeout { hash: String, peer: String },

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

pub type Result<T> = std::result::Result<T, FileError>;
