//! # Error Types
//!
//! Errors raised while turning datagrams into packets and back.

use thiserror::Error;

/// Wire encoding and decoding failures. Decoders drop the datagram.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Bytes are not a valid protobuf message.
    #[error("malformed packet: {0}")]
    Malformed(#[from] prost::DecodeError),

    /// The packet decoded but carries no payload.
    #[error("packet carries no payload")]
    EmptyPacket,

    /// A nested message that must be present is absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// A fixed-size byte field has the wrong length.
    #[error("field `{field}` must be {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The encoded packet does not fit in one datagram.
    #[error("encoded packet is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, CodecError>;
