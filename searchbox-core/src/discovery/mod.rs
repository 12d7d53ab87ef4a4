// 🟢 GREEN Phase: Node discovery keeping the client's server list current

mod nodes_info;

pub use nodes_info::{parse_publish_address, NodesInfoSource};

use crate::client::ClientCore;
use crate::config::{ClientConfig, DEFAULT_DISCOVERY_FREQUENCY};
use crate::error::{SearchboxError, SearchboxResult};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Where discovered server URLs come from
#[async_trait]
pub trait NodeSource: Send + Sync + fmt::Debug {
    /// Query the cluster for the base URLs of its HTTP-enabled nodes
    async fn discover(&self, core: &ClientCore) -> SearchboxResult<Vec<String>>;
}

/// Discovery settings taken from the client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySettings {
    pub frequency: Duration,
    pub filter: Option<String>,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_DISCOVERY_FREQUENCY,
            filter: None,
        }
    }
}

impl From<&ClientConfig> for DiscoverySettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            frequency: config.discovery_frequency,
            filter: config.discovery_filter.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryState {
    New,
    Starting,
    Running,
    Stopped,
    Failed,
}

#[derive(Debug)]
struct Shared {
    state: RwLock<DiscoveryState>,
    cycles: AtomicU64,
}

/// Periodically refreshes a client's server list from the cluster
pub struct NodeChecker {
    settings: DiscoverySettings,
    core: ClientCore,
    source: Arc<dyn NodeSource>,
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl NodeChecker {
    /// Checker that polls the nodes info API through `core`
    pub fn new(settings: DiscoverySettings, core: ClientCore) -> Self {
        let source = NodesInfoSource::new(settings.filter.clone());
        Self::with_source(settings, core, Arc::new(source))
    }

    pub fn with_source(settings: DiscoverySettings, core: ClientCore, source: Arc<dyn NodeSource>) -> Self {
        Self {
            settings,
            core,
            source,
            shared: Arc::new(Shared {
                state: RwLock::new(DiscoveryState::New),
                cycles: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &DiscoverySettings {
        &self.settings
    }

    pub fn state(&self) -> DiscoveryState {
        *self.shared.state.read()
    }

    /// Completed discovery cycles
    pub fn cycles(&self) -> u64 {
        self.shared.cycles.load(Ordering::SeqCst)
    }

    /// Run the first discovery cycle, then keep polling in the background.
    ///
    /// Returns once the first cycle has completed. There is no timeout on
    /// that wait; a failed first cycle leaves the checker `Failed`.
    pub async fn start_and_wait(&self) -> SearchboxResult<()> {
        {
            let mut state = self.shared.state.write();
            if *state != DiscoveryState::New {
                return Err(SearchboxError::discovery(format!(
                    "Node checker cannot start from state {:?}",
                    *state
                )));
            }
            *state = DiscoveryState::Starting;
        }

        info!(frequency = ?self.settings.frequency, "Starting node discovery");
        if let Err(e) = run_cycle(&self.core, self.source.as_ref(), &self.shared).await {
            *self.shared.state.write() = DiscoveryState::Failed;
            return Err(e);
        }

        {
            // stop() takes the task lock first, so it either sees the handle
            // or runs before the state check below
            let mut task = self.task.lock();
            let mut state = self.shared.state.write();
            if *state != DiscoveryState::Starting {
                // stopped while the first cycle was running
                return Ok(());
            }
            *state = DiscoveryState::Running;

            *task = Some(tokio::spawn(poll(
                self.core.clone(),
                Arc::clone(&self.source),
                Arc::clone(&self.shared),
                self.settings.frequency,
            )));
        }

        info!(servers = ?self.core.servers(), "Node discovery running");
        Ok(())
    }

    /// Stop polling. The server list keeps its last value.
    pub fn stop(&self) {
        let mut task = self.task.lock();
        if let Some(handle) = task.take() {
            handle.abort();
        }

        let mut state = self.shared.state.write();
        if *state != DiscoveryState::Failed && *state != DiscoveryState::Stopped {
            *state = DiscoveryState::Stopped;
            info!("Node discovery stopped");
        }
    }
}

impl fmt::Debug for NodeChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeChecker")
            .field("settings", &self.settings)
            .field("source", &self.source)
            .field("state", &self.state())
            .field("cycles", &self.cycles())
            .finish()
    }
}

impl Drop for NodeChecker {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

async fn run_cycle(core: &ClientCore, source: &dyn NodeSource, shared: &Shared) -> SearchboxResult<()> {
    let nodes = source.discover(core).await?;
    shared.cycles.fetch_add(1, Ordering::SeqCst);

    if nodes.is_empty() {
        warn!(servers = ?core.servers(), "No nodes discovered, keeping current servers");
        return Ok(());
    }

    debug!(discovered = nodes.len(), "Discovery cycle completed");
    core.set_servers(nodes);
    Ok(())
}

async fn poll(core: ClientCore, source: Arc<dyn NodeSource>, shared: Arc<Shared>, frequency: Duration) {
    // interval panics on a zero period
    let period = frequency.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = run_cycle(&core, source.as_ref(), &shared).await {
            warn!(error = %e, "Node discovery cycle failed, keeping current servers");
        }
    }
}
