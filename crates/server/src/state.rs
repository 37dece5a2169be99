// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::aggregator::Aggregator;
use crate::broadcaster::Broadcaster;
use crate::config::ServerConfig;
use crate::controller::ControllerRegistry;
use crate::dispatcher::Dispatcher;
use crate::gateway::registry::AgentRegistry;
use crate::license::LicenseCache;

/// Shared server state. Each field encapsulates its own internal locking;
/// nothing here is a bare `Mutex<...>` at this level. `registry` is `Arc`'d
/// on its own (not just via the outer `Arc<AppState>`) because the
/// dispatcher's per-agent pump tasks outlive any single request and need
/// their own handle to it.
pub struct AppState {
    pub storage: pankha_storage::Storage,
    pub registry: Arc<AgentRegistry>,
    pub aggregator: Arc<Aggregator>,
    pub broadcaster: Broadcaster,
    pub dispatcher: Dispatcher,
    pub controller_state: ControllerRegistry,
    pub license: LicenseCache,
    pub config: ServerConfig,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        storage: pankha_storage::Storage,
        config: ServerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let registry = Arc::new(AgentRegistry::new());
        let aggregator = Arc::new(Aggregator::with_history_capacity(config.history_queue_capacity));
        let broadcaster = Broadcaster::new(aggregator.subscribe());
        let dispatcher = Dispatcher::new(Arc::clone(&registry));
        Self {
            storage,
            registry,
            aggregator,
            broadcaster,
            dispatcher,
            controller_state: ControllerRegistry::new(),
            license: LicenseCache::new(),
            config,
            shutdown,
        }
    }
}
