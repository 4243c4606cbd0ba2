//! # Shared Bus - Frontend Update Channel
//!
//! The network core reports everything user-visible (new rumors, peers,
//! private messages, file progress, chain head) through the
//! [`FrontendSink`] trait. The HTTP frontend, a test, or the log decides
//! what to do with it.
//!
//! ```text
//! ┌──────────────┐  push_*()   ┌──────────────────────┐  subscribe()  ┌──────────┐
//! │ rumor / file │ ──────────→ │ InMemoryFrontendBus  │ ────────────→ │ frontend │
//! │ chain core   │             │ (broadcast + history)│    drain()    │ / tests  │
//! └──────────────┘             └──────────────────────┘               └──────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{FrontendTopic, FrontendUpdate, UpdateFilter};
pub use publisher::{FrontendSink, InMemoryFrontendBus, LoggingFrontendSink, NullFrontendSink};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum updates buffered per live subscriber.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Maximum updates kept for pollers.
pub const DEFAULT_HISTORY_CAPACITY: usize = 4096;
