// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan profile controller: one tick loop that walks every online system's
//! active assignments, resolves temperatures, applies curve + hysteresis,
//! and dispatches `setFanSpeed` commands — plus an independent emergency
//! sweep that bypasses stepping entirely (spec §4.5).

pub mod curve;
pub mod hysteresis;
pub mod selector;
pub mod state_machine;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use pankha_protocol::command::{OutboundCommand, Priority, SetFanSpeedPayload};
use pankha_storage::Storage;

use crate::aggregator::Aggregator;
use crate::dispatcher::Dispatcher;
use crate::error::ServerResult;
use crate::gateway::registry::AgentRegistry;
use crate::state::AppState;
pub use hysteresis::ControllerState;
pub use state_machine::{FanControlState, FanController};

#[derive(Debug, Default)]
struct FanEntry {
    hysteresis: ControllerState,
    machine: FanController,
}

/// Per-fan controller memory, shared between the tick loop and the REST
/// handlers that need to react to assignment and manual-write events.
#[derive(Default)]
pub struct ControllerRegistry {
    entries: RwLock<HashMap<i64, FanEntry>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    async fn with_entry<R>(&self, fan_id: i64, f: impl FnOnce(&mut FanEntry) -> R) -> R {
        let mut entries = self.entries.write().await;
        f(entries.entry(fan_id).or_default())
    }

    pub async fn state_of(&self, fan_id: i64) -> FanControlState {
        self.entries.read().await.get(&fan_id).map(|e| e.machine.state()).unwrap_or(FanControlState::Unassigned)
    }

    /// Resets the hysteresis memory for a fan so the next tick writes
    /// unconditionally (assignment created/modified/deleted, sensor or
    /// profile changed, or the owning agent went offline).
    pub async fn clear(&self, fan_id: i64) {
        self.with_entry(fan_id, |entry| entry.hysteresis.clear()).await;
    }

    pub async fn clear_many(&self, fan_ids: &[i64]) {
        for &fan_id in fan_ids {
            self.clear(fan_id).await;
        }
    }

    pub async fn note_assignment_created(&self, fan_id: i64) {
        self.with_entry(fan_id, |entry| entry.machine.on_assignment_created()).await;
    }

    pub async fn note_assignment_deleted(&self, fan_id: i64) {
        self.with_entry(fan_id, |entry| entry.machine.on_assignment_deleted()).await;
        self.clear(fan_id).await;
    }

    /// A direct REST `setFanSpeed` landed on this fan; the controller
    /// yields to it for the remainder of the current tick.
    pub async fn note_manual_write(&self, fan_id: i64) {
        self.with_entry(fan_id, |entry| entry.machine.on_manual_write()).await;
    }
}

/// Runs the tick loop until `cancel` fires, logging (and skipping, never
/// panicking) on a tick that overruns twice its own interval.
pub async fn run(state: Arc<AppState>, cancel: CancellationToken) {
    let interval_duration = state.config.controller_tick_interval();
    let mut interval = tokio::time::interval(interval_duration);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let started = Instant::now();
                if let Err(error) = run_tick(
                    &state.storage,
                    &state.registry,
                    &state.aggregator,
                    &state.dispatcher,
                    &state.controller_state,
                )
                .await
                {
                    tracing::error!(%error, "controller tick failed");
                }
                let elapsed = started.elapsed();
                if elapsed > interval_duration * 2 {
                    tracing::warn!(?elapsed, budget = ?interval_duration, "controller tick overran its budget, skipping ahead");
                }
            }
        }
    }
}

/// One pass over every online system: emergency sweep first (independent of
/// assignment), then the normal curve-driven control for assigned,
/// PWM-capable, enabled fans.
pub async fn run_tick(
    storage: &Storage,
    registry: &AgentRegistry,
    aggregator: &Aggregator,
    dispatcher: &Dispatcher,
    controller: &ControllerRegistry,
) -> ServerResult<()> {
    let now = Instant::now();
    for system in storage.systems.list().await? {
        if !registry.is_online(&system.agent_id).await || !system.enable_fan_control {
            continue;
        }
        let Some(snapshot) = aggregator.snapshot(&system.agent_id).await else {
            continue;
        };

        let over_emergency = snapshot.sensors.values().any(|s| s.temperature > system.emergency_temp);
        let emergency_band_floor = system.emergency_temp - system.hysteresis_temp.max(0.0);
        let under_emergency_band = snapshot.sensors.values().all(|s| s.temperature < emergency_band_floor);

        let fans = storage.fans.list_for_system(system.id).await?;
        let assignments = storage.assignments.list_for_system(system.id).await?;
        let by_fan: HashMap<i64, _> = assignments.iter().map(|a| (a.fan_id, a)).collect();

        for fan in &fans {
            if !fan.has_pwm_control || !fan.enabled {
                continue;
            }

            let entered_emergency = controller
                .with_entry(fan.id, |entry| {
                    entry.machine.on_temperature(over_emergency, under_emergency_band);
                    entry.machine.state() == FanControlState::Emergency
                })
                .await;

            if entered_emergency {
                let already_full = controller.with_entry(fan.id, |entry| entry.hysteresis.last_applied_speed() == Some(100)).await;
                if !already_full {
                    dispatcher
                        .dispatch(
                            &system.agent_id,
                            OutboundCommand::SetFanSpeed(SetFanSpeedPayload { fan_id: fan.fan_name.clone(), speed: 100 }),
                            Priority::Emergency,
                        )
                        .await;
                }
                controller.with_entry(fan.id, |entry| entry.hysteresis.force(100, system.emergency_temp, now)).await;
                continue;
            }

            let Some(assignment) = by_fan.get(&fan.id) else {
                controller.with_entry(fan.id, |entry| entry.machine.on_assignment_deleted()).await;
                continue;
            };

            let is_controllable = controller
                .with_entry(fan.id, |entry| {
                    entry.machine.on_assignment_created();
                    entry.machine.tick_advance();
                    entry.machine.is_controllable()
                })
                .await;
            if !is_controllable {
                continue;
            }

            let Some(temperature) = selector::resolve_temperature(storage, system.id, &snapshot, assignment).await else {
                continue;
            };
            let points = storage.profiles.curve_points(assignment.profile_id).await?;
            if points.is_empty() {
                continue;
            }
            let raw_target = curve::interpolate(&points, temperature);

            let target = controller
                .with_entry(fan.id, |entry| {
                    entry.hysteresis.decide(
                        temperature,
                        raw_target,
                        fan.min_speed,
                        fan.max_speed,
                        system.fan_step_percent,
                        system.hysteresis_temp,
                        now,
                    )
                })
                .await;

            if let Some(target) = target {
                dispatcher
                    .dispatch(
                        &system.agent_id,
                        OutboundCommand::SetFanSpeed(SetFanSpeedPayload {
                            fan_id: fan.fan_name.clone(),
                            speed: target.clamp(0, 100) as u8,
                        }),
                        Priority::Normal,
                    )
                    .await;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
