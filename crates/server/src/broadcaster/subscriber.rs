// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-subscriber outbound task: turns aggregator events into deltas or
//! full-state resyncs, with drop-oldest back-pressure on a slow browser.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use super::delta;
use super::queue::DropOldestQueue;
use super::resync::snapshot_to_view;
use crate::aggregator::{Aggregator, AgentSnapshot, AggregatorEvent};
use pankha_protocol::BrowserOutbound;

const SUBSCRIBER_QUEUE_CAPACITY: usize = 256;
const FULL_RESYNC_INTERVAL: Duration = Duration::from_secs(300);

/// What a browser subscriber currently wants to see: one agent or every
/// agent the license/visibility rules let it see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionScope {
    Agent(String),
    All,
}


/// A single browser connection's outbound half. The gateway's websocket
/// write loop drains `outbound` with `recv()`; this task only produces.
pub struct Subscription {
    pub outbound: DropOldestQueue<BrowserOutbound>,
    scope: RwLock<SubscriptionScope>,
    baselines: RwLock<HashMap<String, Arc<AgentSnapshot>>>,
}

impl Subscription {
    pub fn new(scope: SubscriptionScope) -> Arc<Self> {
        Arc::new(Self {
            outbound: DropOldestQueue::new(SUBSCRIBER_QUEUE_CAPACITY),
            scope: RwLock::new(scope),
            baselines: RwLock::new(HashMap::new()),
        })
    }

    pub async fn set_scope(&self, scope: SubscriptionScope) {
        *self.scope.write().await = scope;
        self.baselines.write().await.clear();
    }

    async fn wants(&self, agent_id: &str) -> bool {
        match &*self.scope.read().await {
            SubscriptionScope::All => true,
            SubscriptionScope::Agent(id) => id == agent_id,
        }
    }

    fn push(&self, message: BrowserOutbound) {
        if self.outbound.push(message) {
            tracing::debug!("subscriber outbound queue full, dropped oldest frame");
            self.outbound.push(BrowserOutbound::ResyncSuggested);
        }
    }

    pub async fn full_sync(&self, aggregator: &Aggregator) {
        let scope = self.scope.read().await.clone();
        let snapshots = aggregator.all_snapshots().await;
        let mut baselines = self.baselines.write().await;
        baselines.clear();
        let mut agents = Vec::new();
        for (agent_id, snapshot) in snapshots {
            if matches!(&scope, SubscriptionScope::Agent(id) if id != &agent_id) {
                continue;
            }
            agents.push(snapshot_to_view(&agent_id, &snapshot));
            baselines.insert(agent_id, snapshot);
        }
        drop(baselines);
        self.push(BrowserOutbound::FullState { agents });
    }

    async fn handle_data_aggregated(&self, aggregator: &Aggregator, agent_id: &str) {
        if !self.wants(agent_id).await {
            return;
        }
        let Some(current) = aggregator.snapshot(agent_id).await else { return };
        let baseline = self.baselines.read().await.get(agent_id).cloned();
        let changes = delta::diff(baseline.as_deref(), &current);
        self.baselines.write().await.insert(agent_id.to_string(), current);
        if changes.is_empty() {
            return;
        }
        self.push(BrowserOutbound::SystemDelta {
            agent_id: agent_id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            changes,
        });
    }
}

/// Drives one subscriber until `cancel` fires: periodic full resync plus
/// reactive deltas off the aggregator's event stream.
pub async fn run(
    subscription: Arc<Subscription>,
    aggregator: Arc<Aggregator>,
    mut events: broadcast::Receiver<AggregatorEvent>,
    cancel: CancellationToken,
) {
    subscription.full_sync(&aggregator).await;
    let mut resync_tick = tokio::time::interval(FULL_RESYNC_INTERVAL);
    resync_tick.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = resync_tick.tick() => {
                subscription.full_sync(&aggregator).await;
            }
            event = events.recv() => {
                match event {
                    Ok(AggregatorEvent::DataAggregated { agent_id }) => {
                        subscription.handle_data_aggregated(&aggregator, &agent_id).await;
                    }
                    Ok(AggregatorEvent::AgentOffline { agent_id }) => {
                        subscription.baselines.write().await.remove(&agent_id);
                        subscription.push(BrowserOutbound::SystemOffline { agent_id });
                    }
                    Ok(AggregatorEvent::NameChanged { agent_id, name }) => {
                        subscription.push(BrowserOutbound::NameChanged { agent_id, name });
                    }
                    Ok(AggregatorEvent::LicenseChanged { tier, agent_limit }) => {
                        subscription.push(BrowserOutbound::LicenseChanged { tier, agent_limit });
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        subscription.full_sync(&aggregator).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    subscription.outbound.close();
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
