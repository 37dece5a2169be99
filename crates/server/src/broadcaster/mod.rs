// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fans aggregator events out to every connected browser subscriber.

pub mod delta;
pub mod queue;
pub mod resync;
pub mod subscriber;

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::aggregator::{Aggregator, AggregatorEvent};
pub use subscriber::{Subscription, SubscriptionScope};

/// Holds a template receiver so every new browser connection can get its
/// own independent receiver via `resubscribe()` without touching the
/// aggregator again.
pub struct Broadcaster {
    events: broadcast::Receiver<AggregatorEvent>,
}

impl Broadcaster {
    pub fn new(events: broadcast::Receiver<AggregatorEvent>) -> Self {
        Self { events }
    }

    /// Registers a new subscriber task for one browser connection, spawning
    /// its background loop. Returns the `Subscription` handle the gateway's
    /// websocket layer reads outbound frames from.
    pub fn connect(&self, aggregator: Arc<Aggregator>, scope: SubscriptionScope, cancel: CancellationToken) -> Arc<Subscription> {
        let subscription = Subscription::new(scope);
        tokio::spawn(subscriber::run(Arc::clone(&subscription), aggregator, self.events.resubscribe(), cancel));
        subscription
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
