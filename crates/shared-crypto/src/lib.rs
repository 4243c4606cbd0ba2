//! # Shared Crypto
//!
//! Hashing and signature primitives used by the file and chain subsystems.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Chunk hashes, metahashes, search fingerprints |
//! | `signatures` | RSA-2048 PKCS#1 v1.5 over SHA-256 | Ownership transactions |
//!
//! Public keys travel as PKCS#1 `RSAPublicKey` DER. Signatures are exactly
//! 256 bytes.

#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use errors::CryptoError;
pub use hashing::{sha256, Sha256Hasher};
pub use signatures::{verify, RsaKeyPair, RSA_KEY_BITS};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
