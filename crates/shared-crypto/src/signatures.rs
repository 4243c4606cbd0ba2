//! # RSA Signatures
//!
//! RSA-2048 with PKCS#1 v1.5 padding over the SHA-256 of the signed bytes.
//!
//! ## Wire Forms
//!
//! - Public key: PKCS#1 `RSAPublicKey` DER (`SEQUENCE { n, e }`)
//! - Signature: 256 bytes, big-endian, left-padded
//! - Private key on disk: PKCS#1 PEM

use std::path::Path;

use rand::rngs::OsRng;
use rsa::pkcs1::{
    DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding,
};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::CryptoError;

/// Key size. Signatures of this size are exactly 256 bytes.
pub const RSA_KEY_BITS: usize = 2048;

const SIGNATURE_LEN: usize = RSA_KEY_BITS / 8;

/// RSA keypair with its public half cached in DER form.
#[derive(Clone)]
pub struct RsaKeyPair {
    private_key: RsaPrivateKey,
    public_der: Vec<u8>,
}

impl std::fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKeyPair")
            .field("public_der_len", &self.public_der.len())
            .finish_non_exhaustive()
    }
}

impl RsaKeyPair {
    /// Generate a fresh 2048-bit keypair.
    pub fn generate() -> Result<Self, CryptoError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_KEY_BITS)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        Self::from_private_key(private_key)
    }

    fn from_private_key(private_key: RsaPrivateKey) -> Result<Self, CryptoError> {
        let public_der = RsaPublicKey::from(&private_key)
            .to_pkcs1_der()
            .map_err(|_| CryptoError::InvalidPublicKey)?
            .as_bytes()
            .to_vec();
        Ok(Self {
            private_key,
            public_der,
        })
    }

    /// Parse a PKCS#1 PEM private key.
    pub fn from_pkcs1_pem(pem: &str) -> Result<Self, CryptoError> {
        let private_key =
            RsaPrivateKey::from_pkcs1_pem(pem).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Self::from_private_key(private_key)
    }

    /// Serialize the private key as PKCS#1 PEM.
    pub fn to_pkcs1_pem(&self) -> Result<String, CryptoError> {
        let pem = self
            .private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(pem.as_str().to_owned())
    }

    /// Load the key stored at `path`, or generate one and store it there.
    pub fn load_or_generate(path: &Path) -> Result<Self, CryptoError> {
        if path.exists() {
            let pem = std::fs::read_to_string(path)?;
            return Self::from_pkcs1_pem(&pem);
        }
        let keypair = Self::generate()?;
        std::fs::write(path, keypair.to_pkcs1_pem()?)?;
        Ok(keypair)
    }

    /// PKCS#1 DER encoding of the public key.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_der
    }

    /// Sign `SHA256(message)`.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; SIGNATURE_LEN], CryptoError> {
        let digest = Sha256::digest(message);
        let signature = self
            .private_key
            .sign_with_rng(&mut OsRng, Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        signature
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength {
                expected: SIGNATURE_LEN,
                actual: signature.len(),
            })
    }
}

/// Check that `signature` signs `SHA256(message)` under the DER public key.
pub fn verify(public_key_der: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let public_key =
        RsaPublicKey::from_pkcs1_der(public_key_der).map_err(|_| CryptoError::InvalidPublicKey)?;
    let digest = Sha256::digest(message);
    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}
