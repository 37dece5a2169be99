// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live per-agent snapshot plus the async history writer feed.

pub mod history_writer;
pub mod snapshot;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, RwLock};

pub use snapshot::{AgentSnapshot, FanSnapshot, SensorSnapshot, SystemHealthSnapshot};

use crate::error::ServerResult;
use pankha_protocol::DataPayload;
use pankha_storage::types::HistorySample;
use pankha_storage::Storage;

/// Control-plane events the aggregator emits for the broadcaster to consume.
#[derive(Debug, Clone)]
pub enum AggregatorEvent {
    DataAggregated { agent_id: String },
    AgentOffline { agent_id: String },
    NameChanged { agent_id: String, name: String },
    LicenseChanged { tier: String, agent_limit: Option<u32> },
}

/// Keeps the live view in memory and feeds both the broadcaster (via the
/// event channel) and the history writer (via a bounded, best-effort queue).
pub struct Aggregator {
    snapshots: RwLock<HashMap<String, Arc<AgentSnapshot>>>,
    event_tx: broadcast::Sender<AggregatorEvent>,
    history_tx: mpsc::Sender<Vec<HistorySample>>,
    history_rx: tokio::sync::Mutex<Option<mpsc::Receiver<Vec<HistorySample>>>>,
    dropped_history_batches: AtomicU64,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::with_history_capacity(4096)
    }

    pub fn with_history_capacity(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        let (history_tx, history_rx) = mpsc::channel(capacity);
        Self {
            snapshots: RwLock::new(HashMap::new()),
            event_tx,
            history_tx,
            history_rx: tokio::sync::Mutex::new(Some(history_rx)),
            dropped_history_batches: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AggregatorEvent> {
        self.event_tx.subscribe()
    }

    /// Takes ownership of the history receiver; callable exactly once
    /// (by `run()` when it spawns the history writer task).
    pub async fn take_history_receiver(&self) -> Option<mpsc::Receiver<Vec<HistorySample>>> {
        self.history_rx.lock().await.take()
    }

    pub fn dropped_history_batches(&self) -> u64 {
        self.dropped_history_batches.load(Ordering::Relaxed)
    }

    pub async fn snapshot(&self, agent_id: &str) -> Option<Arc<AgentSnapshot>> {
        self.snapshots.read().await.get(agent_id).cloned()
    }

    pub async fn all_snapshots(&self) -> HashMap<String, Arc<AgentSnapshot>> {
        self.snapshots.read().await.clone()
    }

    /// Ingests one `data` frame: upserts newly seen sensors/fans, replaces
    /// the agent's snapshot wholesale, queues a history batch, and notifies
    /// subscribers that new data is available.
    pub async fn ingest(&self, storage: &Storage, system_id: i64, agent_id: &str, data: &DataPayload) -> ServerResult<()> {
        let timestamp = chrono::DateTime::parse_from_rfc3339(&data.timestamp)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now());
        let mut history = Vec::with_capacity(data.sensors.len() + data.fans.len());

        for sensor in &data.sensors {
            let sensor_row = storage
                .sensors
                .upsert(
                    system_id,
                    &pankha_storage::types::SensorUpsert {
                        sensor_name: sensor.id.clone(),
                        sensor_label: sensor.id.clone(),
                        sensor_type: "other".into(),
                        temp_max: None,
                        temp_crit: None,
                    },
                )
                .await?;
            storage.sensors.update_reading(sensor_row.id, sensor.temperature).await?;
            history.push(HistorySample {
                system_id,
                sensor_id: Some(sensor_row.id),
                fan_id: None,
                temperature: Some(sensor.temperature),
                fan_speed: None,
                fan_rpm: None,
                timestamp,
            });
        }

        for fan in &data.fans {
            let fan_row = storage
                .fans
                .upsert(
                    system_id,
                    &pankha_storage::types::FanUpsert {
                        fan_name: fan.id.clone(),
                        fan_label: fan.id.clone(),
                        min_speed: 0,
                        max_speed: 100,
                        has_pwm_control: false,
                    },
                )
                .await?;
            storage.fans.update_reading(fan_row.id, fan.rpm as i64, fan.speed as i64).await?;
            history.push(HistorySample {
                system_id,
                sensor_id: None,
                fan_id: Some(fan_row.id),
                temperature: None,
                fan_speed: Some(fan.speed as i64),
                fan_rpm: Some(fan.rpm as i64),
                timestamp,
            });
        }

        let snapshot = Arc::new(AgentSnapshot::from_data_payload(data));
        self.snapshots.write().await.insert(agent_id.to_string(), snapshot);

        if !history.is_empty() && self.history_tx.try_send(history).is_err() {
            self.dropped_history_batches.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(agent_id, "history queue full, dropping oldest batch");
        }

        let _ = self.event_tx.send(AggregatorEvent::DataAggregated { agent_id: agent_id.to_string() });
        Ok(())
    }

    /// Removes the live snapshot and tells subscribers to stop emitting
    /// deltas for this agent until it registers again.
    pub async fn mark_offline(&self, agent_id: &str) {
        self.snapshots.write().await.remove(agent_id);
        let _ = self.event_tx.send(AggregatorEvent::AgentOffline { agent_id: agent_id.to_string() });
    }

    pub fn notify_name_changed(&self, agent_id: &str, name: &str) {
        let _ = self
            .event_tx
            .send(AggregatorEvent::NameChanged { agent_id: agent_id.to_string(), name: name.to_string() });
    }

    pub fn notify_license_changed(&self, tier: &str, agent_limit: Option<u32>) {
        let _ = self.event_tx.send(AggregatorEvent::LicenseChanged { tier: tier.to_string(), agent_limit });
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
