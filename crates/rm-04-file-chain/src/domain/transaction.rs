//! Signed ownership claims.
//!
//! A first claim signs the file hash with the owner's key. A transfer is
//! signed by the previous owner over the previous claim's signature bytes
//! and carries the new owner's public key.

use shared_crypto::{verify, RsaKeyPair};
use shared_types::{FileRecord, Signature, Transaction};

use super::{ChainError, Result};

/// Claim `file` for the holder of `owner`.
pub fn sign_ownership(file: FileRecord, owner: &RsaKeyPair) -> Result<Transaction> {
    let signature = Signature(owner.sign(&file.hash())?);
    Ok(Transaction {
        signature,
        file,
        public_key: owner.public_key_der().to_vec(),
    })
}

/// Hand the file of `previous` over to `new_owner_public_key`.
/// `previous_owner` must hold the key of `previous`.
pub fn transfer_ownership(
    previous: &Transaction,
    previous_owner: &RsaKeyPair,
    new_owner_public_key: &[u8],
) -> Result<Transaction> {
    if previous_owner.public_key_der() != previous.public_key.as_slice() {
        return Err(ChainError::Crypto("not the current owner".into()));
    }
    let signature = Signature(previous_owner.sign(previous.signature.as_bytes())?);
    Ok(Transaction {
        signature,
        file: previous.file.clone(),
        public_key: new_owner_public_key.to_vec(),
    })
}

/// `tx` is a first claim signed by its own key.
pub fn verify_claim(tx: &Transaction) -> bool {
    verify(&tx.public_key, &tx.file.hash(), tx.signature.as_bytes()).is_ok()
}

/// `next` was signed by the owner of `previous` over its signature.
pub fn verify_transfer(previous: &Transaction, next: &Transaction) -> bool {
    verify(
        &previous.public_key,
        previous.signature.as_bytes(),
        next.signature.as_bytes(),
    )
    .is_ok()
}
