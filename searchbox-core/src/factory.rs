// 🟢 GREEN Phase: Client factory
// Resolves an optional configuration into a ready-to-use client

use crate::client::{ClientCore, SearchClient};
use crate::codec::{Codec, JsonCodec};
use crate::config::ClientConfig;
use crate::discovery::{DiscoverySettings, NodeChecker};
use crate::error::SearchboxResult;
use crate::http::{AsyncExecutor, ConnectionManager, HttpExecutor, PoolLimits, RequestConfig};
use crate::servers::ServerPool;
use std::sync::Arc;
use tracing::{debug, info};

/// Server used when the factory has no configuration
pub const DEFAULT_SERVER: &str = "http://localhost:9200";

/// Builds [`SearchClient`]s from an optional [`ClientConfig`]
#[derive(Debug, Clone, Default)]
pub struct ClientFactory {
    config: Option<ClientConfig>,
}

impl ClientFactory {
    pub fn new(config: Option<ClientConfig>) -> Self {
        Self { config }
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::new(Some(config))
    }

    pub fn set_config(&mut self, config: ClientConfig) {
        self.config = Some(config);
    }

    pub fn config(&self) -> Option<&ClientConfig> {
        self.config.as_ref()
    }

    /// Build a new, independent client.
    ///
    /// With discovery enabled this does not return until the first
    /// discovery cycle has completed, and a failure of that cycle is
    /// returned as the error.
    pub async fn build(&self) -> SearchboxResult<SearchClient> {
        let Some(config) = &self.config else {
            debug!("There is no configuration to create http client. Going to create simple client with default values");
            let core = ClientCore::new(
                ServerPool::new([DEFAULT_SERVER]),
                HttpExecutor::basic()?,
                Arc::new(JsonCodec::new()),
            );
            return Ok(SearchClient::new(core, AsyncExecutor::new()?, None));
        };

        debug!("Creating HTTP client based on configuration");
        let servers = ServerPool::new(config.servers.iter().cloned());
        let engine = HttpExecutor::new(
            resolve_connection_manager(config),
            create_request_config(config),
        )?;
        let codec: Arc<dyn Codec> = match &config.codec {
            Some(codec) => Arc::clone(codec),
            None => Arc::new(JsonCodec::new()),
        };
        let async_engine = AsyncExecutor::new()?;

        let core = ClientCore::new(servers, engine, codec);

        let node_checker = if config.discovery_enabled {
            info!("Node Discovery Enabled...");
            let checker = NodeChecker::new(DiscoverySettings::from(config), core.clone());
            checker.start_and_wait().await?;
            Some(checker)
        } else {
            info!("Node Discovery Disabled...");
            None
        };

        Ok(SearchClient::new(core, async_engine, node_checker))
    }
}

/// Timeouts for the synchronous engine. Zero disables a timeout.
pub fn create_request_config(config: &ClientConfig) -> RequestConfig {
    RequestConfig::new(config.conn_timeout, config.read_timeout)
}

/// Choose and size the connection manager.
///
/// Pool sizing only applies to multi-threaded configurations; values are
/// passed through unchecked.
pub fn resolve_connection_manager(config: &ClientConfig) -> ConnectionManager {
    if !config.multi_threaded {
        debug!("Default http connection is created without multi threaded option");
        return ConnectionManager::basic();
    }

    let defaults = PoolLimits::default();
    let limits = PoolLimits {
        max_total: config.max_total_connection.unwrap_or(defaults.max_total),
        default_max_per_route: config
            .default_max_total_connection_per_route
            .unwrap_or(defaults.default_max_per_route),
        max_per_route: config.max_total_connection_per_route.clone(),
    };

    debug!("Multi-threaded http connection manager created");
    ConnectionManager::pooling(limits)
}
