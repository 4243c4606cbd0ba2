use shared_crypto::CryptoError;
use thiserror::Error;

use super::TxRejection;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The block hash lacks the required leading zero bytes.
    #[error("block {0} has insufficient proof of work")]
    InsufficientWork(String),

    /// A transaction of the block contradicts its ancestry or another
    /// transaction of the block.
    #[error("block {block} carries a conflicting transaction for {file}")]
    ConflictingTransactions { block: String, file: String },

    #[error("transaction for {file} rejected: {reason}")]
    TransactionRejected { file: String, reason: TxRejection },

    #[error("crypto error: {0}")]
    Crypto(String),
}

impl From<CryptoError> for ChainError {
    fn from(e: CryptoError) -> Self {
        ChainError::Crypto(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ChainError>;
