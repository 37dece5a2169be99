// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-fan control state machine (spec §4.5).
//!
//! ```text
//! unassigned --assign--> controlled --manual write--> manual --next tick--> controlled
//!     ^                     |  ^                                             |
//!     `------ delete -------'  `---------------- temp < emergency - H -------'
//!                           \
//!                            `--- temp > emergencyTemp ---> emergency
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanControlState {
    Unassigned,
    Manual,
    Controlled,
    Emergency,
}

impl FanControlState {
    /// Return the wire-format string for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Manual => "manual",
            Self::Controlled => "controlled",
            Self::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for FanControlState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks one fan's control state plus the state emergency override should
/// return to once the temperature drops back below `emergencyTemp - hysteresis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanController {
    state: FanControlState,
    pre_emergency: FanControlState,
}

impl Default for FanController {
    fn default() -> Self {
        Self { state: FanControlState::Unassigned, pre_emergency: FanControlState::Unassigned }
    }
}

impl FanController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FanControlState {
        self.state
    }

    pub fn on_assignment_created(&mut self) {
        if self.state != FanControlState::Emergency {
            self.state = FanControlState::Controlled;
        } else {
            self.pre_emergency = FanControlState::Controlled;
        }
    }

    pub fn on_assignment_deleted(&mut self) {
        if self.state != FanControlState::Emergency {
            self.state = FanControlState::Unassigned;
        } else {
            self.pre_emergency = FanControlState::Unassigned;
        }
    }

    /// A direct REST `setFanSpeed` arrived. The controller won't fight it
    /// for the rest of the current tick; resumes control next tick.
    pub fn on_manual_write(&mut self) {
        if self.state == FanControlState::Controlled {
            self.state = FanControlState::Manual;
        }
    }

    /// Call once per control tick, after any manual write has been applied,
    /// so a fan written manually this tick is back under control next tick.
    pub fn tick_advance(&mut self) {
        if self.state == FanControlState::Manual {
            self.state = FanControlState::Controlled;
        }
    }

    /// Evaluates the emergency condition for this tick. `over` is whether
    /// any sensor on the system currently exceeds `emergencyTemp`; `under`
    /// is whether every sensor has dropped back below
    /// `emergencyTemp - hysteresisTemp`.
    pub fn on_temperature(&mut self, over_emergency: bool, under_emergency_band: bool) {
        match self.state {
            FanControlState::Emergency if under_emergency_band => {
                self.state = self.pre_emergency;
            }
            FanControlState::Emergency => {}
            _ if over_emergency => {
                self.pre_emergency = self.state;
                self.state = FanControlState::Emergency;
            }
            _ => {}
        }
    }

    pub fn is_controllable(&self) -> bool {
        matches!(self.state, FanControlState::Controlled)
    }
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
