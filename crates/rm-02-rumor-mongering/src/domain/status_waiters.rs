//! # Status Waiters
//!
//! Each mongering attempt registers a waiter for the peer it sent a rumor
//! to. An incoming status from that peer goes to the oldest waiter that has
//! not been served yet; if there is none, the status is unsolicited.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;
use shared_types::StatusPacket;
use tokio::sync::oneshot;

struct Waiter {
    peer: SocketAddr,
    slot: Option<oneshot::Sender<StatusPacket>>,
}

/// Pending mongering attempts keyed by attempt id.
pub struct StatusWaiters {
    waiters: Mutex<BTreeMap<u32, Waiter>>,
    next_id: AtomicU32,
}

impl Default for StatusWaiters {
    fn default() -> Self {
        Self {
            waiters: Mutex::new(BTreeMap::new()),
            next_id: AtomicU32::new(1),
        }
    }
}

impl StatusWaiters {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh attempt id. Ids grow with age.
    pub fn next_attempt_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Wait for a status from `peer` under `attempt`.
    ///
    /// # Panics
    ///
    /// If `attempt` is already registered.
    pub fn register(&self, attempt: u32, peer: SocketAddr) -> oneshot::Receiver<StatusPacket> {
        let (sender, receiver) = oneshot::channel();
        let previous = self.waiters.lock().insert(
            attempt,
            Waiter {
                peer,
                slot: Some(sender),
            },
        );
        assert!(previous.is_none(), "attempt {attempt} registered twice");
        receiver
    }

    /// Forget `attempt`. Its receiver may still hold a status delivered just
    /// before the call.
    pub fn unregister(&self, attempt: u32) {
        self.waiters.lock().remove(&attempt);
    }

    /// Hand `status` to the oldest unserved waiter for `from`. Returns
    /// `false` when nobody was waiting.
    pub fn search_and_forward(&self, from: SocketAddr, status: &StatusPacket) -> bool {
        let mut waiters = self.waiters.lock();
        for waiter in waiters.values_mut() {
            if waiter.peer != from {
                continue;
            }
            let Some(slot) = waiter.slot.take() else {
                continue;
            };
            if slot.send(status.clone()).is_ok() {
                return true;
            }
        }
        false
    }

    /// Registered attempts, served or not.
    pub fn pending(&self) -> usize {
        self.waiters.lock().len()
    }
}
