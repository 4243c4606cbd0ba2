//! # Frontend Subscriptions
//!
//! Receiving side of [`crate::InMemoryFrontendBus`].

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::warn;

use crate::events::{FrontendUpdate, UpdateFilter};

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped.
    #[error("Frontend bus closed")]
    Closed,
}

/// A live feed of updates matching a filter.
pub struct Subscription {
    receiver: broadcast::Receiver<FrontendUpdate>,
    filter: UpdateFilter,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<FrontendUpdate>, filter: UpdateFilter) -> Self {
        Self { receiver, filter }
    }

    /// Wait for the next matching update. Lagged updates are skipped.
    pub async fn recv(&mut self) -> Result<FrontendUpdate, SubscriptionError> {
        loop {
            match self.receiver.recv().await {
                Ok(update) if self.filter.matches(&update) => return Ok(update),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Frontend subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(SubscriptionError::Closed),
            }
        }
    }

    /// Next matching update if one is already buffered.
    pub fn try_recv(&mut self) -> Option<FrontendUpdate> {
        loop {
            match self.receiver.try_recv() {
                Ok(update) if self.filter.matches(&update) => return Some(update),
                Ok(_) => continue,
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
