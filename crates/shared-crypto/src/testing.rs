//! Cached RSA keypairs for tests. Key generation is slow, so each index is
//! generated once per process.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::RsaKeyPair;

static FIXTURES: OnceLock<Mutex<HashMap<usize, RsaKeyPair>>> = OnceLock::new();

/// The keypair for `index`, generated on first use.
pub fn fixture_keypair(index: usize) -> RsaKeyPair {
    let fixtures = FIXTURES.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = match fixtures.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard
        .entry(index)
        .or_insert_with(|| match RsaKeyPair::generate() {
            Ok(keypair) => keypair,
            Err(e) => panic!("fixture key generation failed: {e}"),
        })
        .clone()
}
