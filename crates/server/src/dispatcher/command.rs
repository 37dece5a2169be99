// SPDX-License-Identifier: MIT OR Apache-2.0

use std::cmp::Ordering;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use pankha_protocol::{OutboundCommand, Priority};

/// Terminal result of one dispatched command, delivered to whoever called
/// `Dispatcher::dispatch`.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Succeeded(Option<serde_json::Value>),
    Failed { reason: String },
    Timedout,
    Superseded,
    AgentOffline,
}

/// Deadline and retry policy by priority (spec §4.4).
pub fn deadline_for(priority: Priority) -> Duration {
    match priority {
        Priority::Emergency => Duration::from_secs(3),
        Priority::Low => Duration::from_secs(30),
        Priority::Normal | Priority::High => Duration::from_secs(10),
    }
}

/// Max retry attempts after the first send, excluding emergency commands
/// which never retry.
pub fn max_retries_for(priority: Priority) -> u32 {
    match priority {
        Priority::Emergency => 0,
        _ => 2,
    }
}

pub const RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// One entry in an agent's priority queue. Ordering: higher `Priority`
/// first, ties broken FIFO by `seq` (lower sequence number first).
pub(crate) struct QueuedCommand {
    pub priority: Priority,
    pub seq: u64,
    pub command_id: String,
    pub command: OutboundCommand,
    pub responder: oneshot::Sender<CommandOutcome>,
    /// Set when this command targets a fan; cancelled if a later command
    /// for the same fan supersedes it before this one gets an ack.
    pub supersede_cancel: Option<CancellationToken>,
}

impl QueuedCommand {
    pub fn fan_id(&self) -> Option<&str> {
        self.command.fan_id()
    }
}

impl PartialEq for QueuedCommand {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueuedCommand {}

impl PartialOrd for QueuedCommand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedCommand {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority).then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
