//! Outstanding data requests, keyed by the hash asked for.

use std::collections::HashMap;

use parking_lot::Mutex;
use shared_types::{hash_to_hex, Hash};
use tokio::sync::oneshot;

use super::{FileError, Result};

struct DataWaiter {
    /// Only a reply from the peer we asked counts.
    origin: String,
    slot: oneshot::Sender<Vec<u8>>,
}

#[derive(Default)]
pub struct DataWaiters {
    waiters: Mutex<HashMap<Hash, DataWaiter>>,
}

impl DataWaiters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for `hash` from `origin`. At most one request per hash.
    pub fn register(&self, hash: Hash, origin: &str) -> Result<oneshot::Receiver<Vec<u8>>> {
        let mut waiters = self.waiters.lock();
        if waiters.contains_key(&hash) {
            return Err(FileError::AlreadyPending(hash_to_hex(&hash)));
        }
        let (slot, receiver) = oneshot::channel();
        waiters.insert(
            hash,
            DataWaiter {
                origin: origin.to_owned(),
                slot,
            },
        );
        Ok(receiver)
    }

    pub fn unregister(&self, hash: &Hash) {
        self.waiters.lock().remove(hash);
    }

    /// Hand verified `data` to the waiter for `hash`. Returns `false` when
    /// nobody waits or the reply came from the wrong peer.
    pub fn deliver(&self, hash: &Hash, origin: &str, data: Vec<u8>) -> bool {
        let mut waiters = self.waiters.lock();
        match waiters.get(hash) {
            Some(waiter) if waiter.origin == origin => {}
            _ => return false,
        }
        match waiters.remove(hash) {
            Some(waiter) => waiter.slot.send(data).is_ok(),
            None => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.waiters.lock().len()
    }
}
