// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-agent priority queue and correlation table for outbound commands
//! (spec §3, §4.4). Grounded on the same stamp/correlate/retry shape as
//! the upstream bridge's single-connection request table, generalized to
//! per-priority deadlines, retries, and same-fan supersedence.

pub mod command;

use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{oneshot, Mutex, Notify, RwLock};
use tokio_util::sync::CancellationToken;

pub use command::CommandOutcome;
use command::{deadline_for, max_retries_for, QueuedCommand, RETRY_BACKOFF};

use crate::gateway::registry::AgentRegistry;
use pankha_protocol::{AgentOutbound, CommandResponsePayload, OutboundCommand, Priority};

/// Resolves once the dispatcher has a terminal outcome for the command.
/// Dropping this without awaiting it is fine — the command still runs to
/// completion, its result just goes nowhere.
pub struct DispatchHandle {
    rx: oneshot::Receiver<CommandOutcome>,
}

impl DispatchHandle {
    pub async fn outcome(self) -> CommandOutcome {
        self.rx.await.unwrap_or(CommandOutcome::Failed { reason: "dispatcher task ended".into() })
    }
}

struct FanSlot {
    command_id: String,
    cancel: CancellationToken,
}

struct AgentDispatch {
    heap: Mutex<BinaryHeap<QueuedCommand>>,
    pending_fan: Mutex<HashMap<String, FanSlot>>,
    acks: Mutex<HashMap<String, oneshot::Sender<CommandOutcome>>>,
    notify: Notify,
    next_seq: AtomicU64,
    cancel: CancellationToken,
}

impl AgentDispatch {
    fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            pending_fan: Mutex::new(HashMap::new()),
            acks: Mutex::new(HashMap::new()),
            notify: Notify::new(),
            next_seq: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }
}

/// Owns one background pump task per agent that has ever had a command
/// dispatched to it, plus the correlation table for in-flight acks.
pub struct Dispatcher {
    registry: Arc<AgentRegistry>,
    agents: RwLock<HashMap<String, Arc<AgentDispatch>>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self { registry, agents: RwLock::new(HashMap::new()) }
    }

    async fn agent_dispatch(&self, agent_id: &str) -> Arc<AgentDispatch> {
        if let Some(existing) = self.agents.read().await.get(agent_id) {
            return Arc::clone(existing);
        }
        let mut agents = self.agents.write().await;
        if let Some(existing) = agents.get(agent_id) {
            return Arc::clone(existing);
        }
        let dispatch = Arc::new(AgentDispatch::new());
        agents.insert(agent_id.to_string(), Arc::clone(&dispatch));
        tokio::spawn(pump(Arc::clone(&self.registry), Arc::clone(&dispatch), agent_id.to_string()));
        dispatch
    }

    /// Enqueues a command for `agent_id`. Returns immediately with a handle;
    /// callers decide whether to await `outcome()` or fire-and-forget.
    pub async fn dispatch(&self, agent_id: &str, command: OutboundCommand, priority: Priority) -> DispatchHandle {
        let (tx, rx) = oneshot::channel();

        if !self.registry.is_online(agent_id).await {
            let _ = tx.send(CommandOutcome::AgentOffline);
            return DispatchHandle { rx };
        }

        let agent = self.agent_dispatch(agent_id).await;
        let command_id = uuid::Uuid::new_v4().to_string();
        let seq = agent.next_seq.fetch_add(1, Ordering::Relaxed);

        let supersede_cancel = if let Some(fan_id) = command.fan_id() {
            let cancel = CancellationToken::new();
            let mut pending_fan = agent.pending_fan.lock().await;
            if let Some(previous) = pending_fan.insert(fan_id.to_string(), FanSlot { command_id: command_id.clone(), cancel: cancel.clone() }) {
                previous.cancel.cancel();
            }
            Some(cancel)
        } else {
            None
        };

        agent.heap.lock().await.push(QueuedCommand { priority, seq, command_id, command, responder: tx, supersede_cancel });
        agent.notify.notify_one();
        DispatchHandle { rx }
    }

    /// Routes an agent's `commandResponse` frame back to its waiting caller.
    pub async fn resolve(&self, agent_id: &str, response: CommandResponsePayload) {
        let Some(agent) = self.agents.read().await.get(agent_id).cloned() else { return };
        if let Some(tx) = agent.acks.lock().await.remove(&response.command_id) {
            let outcome = if response.success {
                CommandOutcome::Succeeded(response.data)
            } else {
                CommandOutcome::Failed { reason: response.error.unwrap_or_else(|| "agent reported failure".into()) }
            };
            let _ = tx.send(outcome);
        }
    }

    /// Stops the pump task for an agent that's gone offline; in-flight
    /// commands resolve to `AgentOffline` as their acks are dropped.
    pub async fn shutdown_agent(&self, agent_id: &str) {
        if let Some(agent) = self.agents.write().await.remove(agent_id) {
            agent.cancel.cancel();
        }
    }
}

async fn pump(registry: Arc<AgentRegistry>, agent: Arc<AgentDispatch>, agent_id: String) {
    loop {
        let item = loop {
            if let Some(item) = agent.heap.lock().await.pop() {
                break Some(item);
            }
            tokio::select! {
                _ = agent.cancel.cancelled() => break None,
                _ = agent.notify.notified() => {}
            }
        };
        let Some(item) = item else { break };
        process_one(&registry, &agent, &agent_id, item).await;
    }
}

async fn process_one(registry: &AgentRegistry, agent: &AgentDispatch, agent_id: &str, item: QueuedCommand) {
    let QueuedCommand { priority, command_id, command, responder, supersede_cancel, .. } = item;
    let deadline = deadline_for(priority);
    let max_retries = max_retries_for(priority);
    let mut attempt = 0u32;

    let outcome = 'attempts: loop {
        if let Some(cancel) = &supersede_cancel {
            if cancel.is_cancelled() {
                break 'attempts CommandOutcome::Superseded;
            }
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        agent.acks.lock().await.insert(command_id.clone(), ack_tx);

        let frame = AgentOutbound::command(command_id.clone(), command.clone());
        if registry.send(agent_id, frame).await.is_err() {
            agent.acks.lock().await.remove(&command_id);
            break 'attempts CommandOutcome::AgentOffline;
        }

        let wait = async {
            if let Some(cancel) = &supersede_cancel {
                tokio::select! {
                    result = ack_rx => Ok(result),
                    _ = cancel.cancelled() => Err(()),
                }
            } else {
                Ok(ack_rx.await)
            }
        };

        match tokio::time::timeout(deadline, wait).await {
            Ok(Err(())) => break 'attempts CommandOutcome::Superseded,
            Ok(Ok(Ok(outcome))) => break 'attempts outcome,
            Ok(Ok(Err(_))) => break 'attempts CommandOutcome::Failed { reason: "dispatcher task ended".into() },
            Err(_) => {
                agent.acks.lock().await.remove(&command_id);
                if attempt >= max_retries {
                    break 'attempts CommandOutcome::Timedout;
                }
                attempt += 1;
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
        }
    };

    if let Some(fan_id) = command.fan_id() {
        let mut pending_fan = agent.pending_fan.lock().await;
        if pending_fan.get(fan_id).is_some_and(|slot| slot.command_id == command_id) {
            pending_fan.remove(fan_id);
        }
    }

    let _ = responder.send(outcome);
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
