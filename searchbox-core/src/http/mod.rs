// 🟢 GREEN Phase: HTTP execution engines backed by reqwest

use crate::action::{Action, ActionResult};
use crate::codec::Codec;
use crate::error::{SearchboxError, SearchboxResult};
use crate::logging::generate_request_id;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, Instrument};

pub use self::pool::{
    ConnectionManager, Lease, PoolLimits, PoolStats, PoolingConnectionManager,
    DEFAULT_MAX_PER_ROUTE, DEFAULT_MAX_TOTAL,
};
pub use self::route::Route;

mod pool;
mod route;

/// Per-request timeouts applied by an engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestConfig {
    /// How long to wait for a connection slot; `None` waits indefinitely
    pub connection_request_timeout: Option<Duration>,
    /// Socket read timeout; `None` disables it
    pub socket_timeout: Option<Duration>,
}

impl RequestConfig {
    /// Timeouts from configured durations; a zero duration means no timeout
    pub fn new(connection_request_timeout: Duration, socket_timeout: Duration) -> Self {
        Self {
            connection_request_timeout: non_zero(connection_request_timeout),
            socket_timeout: non_zero(socket_timeout),
        }
    }
}

fn non_zero(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

/// Synchronous execution engine: every call completes before returning.
///
/// Cheap to clone; clones share the connection manager and the underlying
/// reqwest pool.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    manager: Arc<ConnectionManager>,
    request_config: RequestConfig,
}

impl HttpExecutor {
    /// Create an engine over `manager` with the given timeouts
    pub fn new(manager: ConnectionManager, request_config: RequestConfig) -> SearchboxResult<Self> {
        let mut builder = Client::builder().pool_max_idle_per_host(manager.idle_per_host());
        if let Some(timeout) = request_config.socket_timeout {
            builder = builder.read_timeout(timeout);
        }

        let client = builder.build().map_err(|e| SearchboxError::Engine {
            message: format!("Failed to build HTTP client: {}", e),
            source: Some(Box::new(e)),
        })?;

        Ok(Self {
            client,
            manager: Arc::new(manager),
            request_config,
        })
    }

    /// Engine defaults: one connection, no timeouts
    pub fn basic() -> SearchboxResult<Self> {
        Self::new(ConnectionManager::basic(), RequestConfig::default())
    }

    pub fn connection_manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn request_config(&self) -> RequestConfig {
        self.request_config
    }

    /// Execute `action` against `server`, reading the whole response
    pub async fn execute(
        &self,
        server: &str,
        action: &Action,
        codec: &dyn Codec,
    ) -> SearchboxResult<ActionResult> {
        let url = action.url_for(server);
        let span = tracing::debug_span!(
            "execute",
            request_id = %generate_request_id(),
            method = %action.method(),
            url = %url,
        );

        self.send(url, action, codec).instrument(span).await
    }

    async fn send(&self, url: String, action: &Action, codec: &dyn Codec) -> SearchboxResult<ActionResult> {
        let route = Route::parse(&url)?;
        let _lease = self
            .manager
            .lease(&route, self.request_config.connection_request_timeout)
            .await?;

        let mut request = self.client.request(action.method().clone(), &url);

        for (key, value) in action.headers() {
            request = request.header(key.as_str(), value.as_str());
        }

        if !action.query_pairs().is_empty() {
            request = request.query(action.query_pairs());
        }

        if let Some(body) = action.json_body() {
            request = request
                .header(reqwest::header::CONTENT_TYPE, codec.content_type())
                .body(codec.encode(body)?);
        }

        let response = request.send().await.map_err(SearchboxError::from_transport)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(SearchboxError::from_transport)?;

        let json = if bytes.is_empty() {
            None
        } else {
            match codec.decode(&bytes) {
                Ok(json) => Some(json),
                Err(e) => {
                    trace!("Response body is not decodable: {}", e);
                    None
                }
            }
        };

        debug!(status, "Request completed");
        Ok(ActionResult::new(
            status,
            String::from_utf8_lossy(&bytes).into_owned(),
            json,
        ))
    }
}

/// Asynchronous execution engine: calls run on a spawned task and report
/// to a completion handler
#[derive(Debug, Clone)]
pub struct AsyncExecutor {
    engine: HttpExecutor,
}

impl AsyncExecutor {
    /// Default engine: default pool sizing, no timeouts
    pub fn new() -> SearchboxResult<Self> {
        let engine = HttpExecutor::new(
            ConnectionManager::pooling(PoolLimits::default()),
            RequestConfig::default(),
        )?;
        Ok(Self { engine })
    }

    pub fn connection_manager(&self) -> &ConnectionManager {
        self.engine.connection_manager()
    }

    /// Run `action` against `server` in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(
        &self,
        server: String,
        action: Action,
        codec: Arc<dyn Codec>,
        handler: F,
    ) -> JoinHandle<()>
    where
        F: FnOnce(SearchboxResult<ActionResult>) + Send + 'static,
    {
        let engine = self.engine.clone();
        tokio::spawn(async move {
            let result = engine.execute(&server, &action, codec.as_ref()).await;
            handler(result);
        })
    }
}
