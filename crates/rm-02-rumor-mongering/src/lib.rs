//! # Rumor Mongering Subsystem
//!
//! Epidemic dissemination of per-origin rumor sequences with vector clocks,
//! plus the private-message overlay and the legacy simple broadcast mode.
//!
//! ## Protocol
//!
//! ```text
//!   A                        B
//!   │ ── Rumor(A, 3) ──────→ │  accept_if_next, route A via sender
//!   │ ←───── Status ──────── │  always answered, duplicate or not
//!   │                        │
//!   │  status covers us  → "IN SYNC WITH B"
//!   │  B lacks a rumor   → monger it to B
//!   │  B is ahead        → send our status back
//! ```
//!
//! A monger waits one second for the status. Without one it flips a coin:
//! heads picks another neighbor and tries again, tails stops. Every second
//! an anti-entropy status goes to a random neighbor, so the logs converge
//! even when mongering gives up.
//!
//! ## Ordering
//!
//! - Per origin, stored ids are exactly `1..=n`; out-of-order rumors are
//!   dropped, not buffered.
//! - A status is handed to the oldest waiting monger for its sender.
//! - Acceptance and the route update happen under the name index lock.

pub mod domain;
pub mod service;

pub use domain::{NameIndex, RumorError, StatusWaiters};
pub use service::{RumorService, RumorSettings};
