// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent and browser WebSocket transport: connection bookkeeping
//! (`registry`), the upgrade handlers (`ws`), and the liveness sweep
//! (`heartbeat`).

pub mod heartbeat;
pub mod registry;
pub mod ws;
