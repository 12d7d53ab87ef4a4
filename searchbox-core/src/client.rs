// 🟢 GREEN Phase: Search client handle

use crate::action::{Action, ActionResult};
use crate::codec::Codec;
use crate::discovery::NodeChecker;
use crate::error::{SearchboxError, SearchboxResult};
use crate::http::{AsyncExecutor, ConnectionManager, HttpExecutor, RequestConfig};
use crate::servers::ServerPool;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Server list, synchronous engine and codec of a client.
///
/// Clones share state. Node discovery holds a clone so it can refresh the
/// server list and query the cluster through the same engine.
#[derive(Clone)]
pub struct ClientCore {
    inner: Arc<CoreInner>,
}

struct CoreInner {
    servers: ServerPool,
    engine: HttpExecutor,
    codec: Arc<dyn Codec>,
}

impl ClientCore {
    pub fn new(servers: ServerPool, engine: HttpExecutor, codec: Arc<dyn Codec>) -> Self {
        Self {
            inner: Arc::new(CoreInner {
                servers,
                engine,
                codec,
            }),
        }
    }

    pub fn servers(&self) -> Vec<String> {
        self.inner.servers.snapshot()
    }

    pub fn server_pool(&self) -> &ServerPool {
        &self.inner.servers
    }

    /// Replace the server list
    pub fn set_servers<I, S>(&self, servers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.servers.replace(servers);
        debug!(servers = ?self.inner.servers.snapshot(), "Server list updated");
    }

    pub fn engine(&self) -> &HttpExecutor {
        &self.inner.engine
    }

    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.inner.codec
    }

    /// Execute `action` on the next server in rotation
    pub async fn execute(&self, action: &Action) -> SearchboxResult<ActionResult> {
        let server = self
            .inner
            .servers
            .next_server()
            .ok_or(SearchboxError::NoServers)?;
        self.execute_on(&server, action).await
    }

    /// Execute `action` on a specific server
    pub async fn execute_on(&self, server: &str, action: &Action) -> SearchboxResult<ActionResult> {
        self.inner
            .engine
            .execute(server, action, self.inner.codec.as_ref())
            .await
    }
}

impl fmt::Debug for ClientCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCore")
            .field("servers", &self.inner.servers.snapshot())
            .field("engine", &self.inner.engine)
            .field("codec", &self.inner.codec)
            .finish()
    }
}

/// Ready-to-use client produced by [`ClientFactory`](crate::factory::ClientFactory)
#[derive(Debug)]
pub struct SearchClient {
    core: ClientCore,
    async_engine: AsyncExecutor,
    node_checker: Option<NodeChecker>,
}

impl SearchClient {
    /// Assemble a client from fully formed parts.
    ///
    /// A `NodeChecker` can only be built from a `ClientCore`, so discovery
    /// is always wired after the engine exists.
    pub fn new(core: ClientCore, async_engine: AsyncExecutor, node_checker: Option<NodeChecker>) -> Self {
        Self {
            core,
            async_engine,
            node_checker,
        }
    }

    pub fn servers(&self) -> Vec<String> {
        self.core.servers()
    }

    pub fn core(&self) -> &ClientCore {
        &self.core
    }

    pub fn connection_manager(&self) -> &ConnectionManager {
        self.core.engine().connection_manager()
    }

    pub fn request_config(&self) -> RequestConfig {
        self.core.engine().request_config()
    }

    pub fn codec(&self) -> &Arc<dyn Codec> {
        self.core.codec()
    }

    pub fn async_engine(&self) -> &AsyncExecutor {
        &self.async_engine
    }

    pub fn node_checker(&self) -> Option<&NodeChecker> {
        self.node_checker.as_ref()
    }

    /// Execute an action and wait for its result
    pub async fn execute(&self, action: &Action) -> SearchboxResult<ActionResult> {
        self.core.execute(action).await
    }

    /// Execute an action in the background, handing the outcome to `handler`
    pub fn execute_async<F>(&self, action: Action, handler: F) -> JoinHandle<()>
    where
        F: FnOnce(SearchboxResult<ActionResult>) + Send + 'static,
    {
        match self.core.server_pool().next_server() {
            Some(server) => self
                .async_engine
                .spawn(server, action, Arc::clone(self.core.codec()), handler),
            None => tokio::spawn(async move { handler(Err(SearchboxError::NoServers)) }),
        }
    }

    /// Stop node discovery, if running
    pub fn shutdown(&self) {
        if let Some(checker) = &self.node_checker {
            checker.stop();
        }
    }
}
