// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory agent registry, mirrored to storage for the fields a
//! reconnecting agent needs to see again.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::error::ServerResult;
use pankha_protocol::AgentOutbound;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Online,
    Offline,
    Registering,
    Error,
}

/// Negotiated runtime settings for an agent, the in-memory mirror of the
/// corresponding `systems` row.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub name: String,
    pub update_interval_ms: i64,
    pub fan_step_percent: i64,
    pub hysteresis_temp: f64,
    pub emergency_temp: f64,
    pub failsafe_speed: i64,
    pub log_level: String,
    pub enable_fan_control: bool,
}

/// The live connection handle for an online agent.
pub struct AgentConnection {
    pub outbound_tx: mpsc::Sender<AgentOutbound>,
    pub cancel: CancellationToken,
}

pub struct AgentSlot {
    pub system_id: i64,
    pub status: RwLock<AgentStatus>,
    pub last_seen_at: RwLock<Option<DateTime<Utc>>>,
    pub last_data_received_at: RwLock<Option<DateTime<Utc>>>,
    pub settings: RwLock<AgentSettings>,
    pub connection: RwLock<Option<AgentConnection>>,
}

/// Per-agent state keyed by `agentId`, behind a keyed lock on the map for
/// structural changes (insert/remove); per-slot fields have their own
/// locks so readers don't block on an unrelated agent's writer.
#[derive(Default)]
pub struct AgentRegistry {
    slots: RwLock<HashMap<String, Arc<AgentSlot>>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, agent_id: &str) -> Option<Arc<AgentSlot>> {
        self.slots.read().await.get(agent_id).cloned()
    }

    pub async fn all_ids(&self) -> Vec<String> {
        self.slots.read().await.keys().cloned().collect()
    }

    /// Registers (or re-registers) an agent: installs the connection
    /// handle and settings snapshot, marking it online. Replaces whatever
    /// connection previously existed — callers cancel the old one first.
    pub async fn register(
        &self,
        agent_id: &str,
        system_id: i64,
        settings: AgentSettings,
        connection: AgentConnection,
    ) -> Arc<AgentSlot> {
        let now = Utc::now();
        let slot = Arc::new(AgentSlot {
            system_id,
            status: RwLock::new(AgentStatus::Online),
            last_seen_at: RwLock::new(Some(now)),
            last_data_received_at: RwLock::new(None),
            settings: RwLock::new(settings),
            connection: RwLock::new(Some(connection)),
        });
        self.slots.write().await.insert(agent_id.to_string(), Arc::clone(&slot));
        slot
    }

    /// Returns the outgoing connection's cancellation token, if any, so the
    /// gateway can tear down a stale connection before installing a new one.
    pub async fn existing_cancel_token(&self, agent_id: &str) -> Option<CancellationToken> {
        let slot = self.get(agent_id).await?;
        let connection = slot.connection.read().await;
        connection.as_ref().map(|c| c.cancel.clone())
    }

    pub async fn mark_offline(&self, agent_id: &str) {
        if let Some(slot) = self.get(agent_id).await {
            *slot.status.write().await = AgentStatus::Offline;
            *slot.connection.write().await = None;
        }
    }

    pub async fn touch_seen(&self, agent_id: &str) {
        if let Some(slot) = self.get(agent_id).await {
            *slot.last_seen_at.write().await = Some(Utc::now());
        }
    }

    pub async fn touch_data_received(&self, agent_id: &str) {
        if let Some(slot) = self.get(agent_id).await {
            *slot.last_data_received_at.write().await = Some(Utc::now());
        }
    }

    pub async fn is_online(&self, agent_id: &str) -> bool {
        match self.get(agent_id).await {
            Some(slot) => matches!(*slot.status.read().await, AgentStatus::Online),
            None => false,
        }
    }

    pub async fn settings(&self, agent_id: &str) -> Option<AgentSettings> {
        let slot = self.get(agent_id).await?;
        Some(slot.settings.read().await.clone())
    }

    /// Applies an in-place edit to an online agent's settings mirror. A
    /// no-op (returns `false`) if the agent has no registry slot, which is
    /// fine — the HTTP handler's storage write is still authoritative and
    /// the mirror catches up on the agent's next `register`.
    pub async fn update_settings(&self, agent_id: &str, f: impl FnOnce(&mut AgentSettings)) -> bool {
        let Some(slot) = self.get(agent_id).await else { return false };
        f(&mut *slot.settings.write().await);
        true
    }

    /// Sends a frame to a connected agent's outbound queue. A `TransportError`
    /// means the caller's command should be treated as `agent_offline`.
    pub async fn send(&self, agent_id: &str, message: AgentOutbound) -> ServerResult<()> {
        let slot = self
            .get(agent_id)
            .await
            .ok_or_else(|| crate::error::PankhaError::transport(format!("agent {agent_id} unknown")))?;
        let connection = slot.connection.read().await;
        let connection = connection
            .as_ref()
            .ok_or_else(|| crate::error::PankhaError::transport(format!("agent {agent_id} offline")))?;
        connection
            .outbound_tx
            .try_send(message)
            .map_err(|_| crate::error::PankhaError::transport(format!("agent {agent_id} outbound queue full")))
    }

    /// Positions agents by admission order and marks every entry at or past
    /// `agent_limit` as read-only. Systems with no registry slot (never
    /// connected) are included so the list endpoint can still annotate them.
    pub fn read_only_status(admission_order: &[String], agent_limit: Option<i64>) -> HashMap<String, bool> {
        let Some(limit) = agent_limit else {
            return admission_order.iter().map(|id| (id.clone(), false)).collect();
        };
        let limit = limit.max(0) as usize;
        admission_order
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index >= limit))
            .collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
