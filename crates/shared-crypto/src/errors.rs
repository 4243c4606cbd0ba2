//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key generation failed
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Signature verification failed
    #[error("Signature verification failed")]
    SignatureVerificationFailed,

    /// Signature has the wrong size for the key
    #[error("Invalid signature length: expected {expected}, got {actual}")]
    InvalidSignatureLength {
        /// Expected signature length in bytes
        expected: usize,
        /// Actual signature length in bytes
        actual: usize,
    },

    /// Public key bytes are not PKCS#1 DER
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Private key bytes are not PKCS#1 PEM
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Reading or writing a key file failed
    #[error("Key file error: {0}")]
    KeyFile(#[from] std::io::Error),
}
