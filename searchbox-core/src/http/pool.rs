// 🟢 GREEN Phase: Connection managers with global and per-route caps

use super::Route;
use crate::error::{SearchboxError, SearchboxResult};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace};

/// Global cap of a pooling manager when none is configured
pub const DEFAULT_MAX_TOTAL: usize = 20;
/// Per-route cap of a pooling manager when none is configured
pub const DEFAULT_MAX_PER_ROUTE: usize = 2;

/// Decides how many connections may be open at once, globally and per route
#[derive(Debug)]
pub enum ConnectionManager {
    /// One connection shared by every request
    Basic(BasicConnectionManager),
    /// Bounded pool of connections
    Pooling(PoolingConnectionManager),
}

impl ConnectionManager {
    pub fn basic() -> Self {
        Self::Basic(BasicConnectionManager::new())
    }

    pub fn pooling(limits: PoolLimits) -> Self {
        Self::Pooling(PoolingConnectionManager::new(limits))
    }

    pub fn is_pooled(&self) -> bool {
        matches!(self, Self::Pooling(_))
    }

    pub fn max_total(&self) -> usize {
        match self {
            Self::Basic(_) => 1,
            Self::Pooling(pool) => pool.limits.max_total,
        }
    }

    pub fn default_max_per_route(&self) -> usize {
        match self {
            Self::Basic(_) => 1,
            Self::Pooling(pool) => pool.limits.default_max_per_route,
        }
    }

    /// Effective cap for `route`: its explicit override, else the default
    pub fn max_per_route(&self, route: &Route) -> usize {
        match self {
            Self::Basic(_) => 1,
            Self::Pooling(pool) => pool.limits.cap_for(route),
        }
    }

    /// Idle connections the HTTP engine may keep per host
    pub fn idle_per_host(&self) -> usize {
        match self {
            Self::Basic(_) => 1,
            Self::Pooling(pool) => pool
                .limits
                .max_per_route
                .values()
                .copied()
                .fold(pool.limits.default_max_per_route, usize::max),
        }
    }

    /// Wait for a connection slot to `route`.
    ///
    /// `timeout` bounds the whole wait; `None` waits indefinitely.
    pub async fn lease(&self, route: &Route, timeout: Option<Duration>) -> SearchboxResult<Lease> {
        let leasing = async {
            match self {
                Self::Basic(basic) => acquire(&basic.connection).await.map(|permit| Lease {
                    route: route.clone(),
                    _route_permit: None,
                    _total_permit: permit,
                }),
                Self::Pooling(pool) => pool.acquire(route).await,
            }
        };

        let lease = match timeout {
            Some(timeout) => tokio::time::timeout(timeout, leasing)
                .await
                .map_err(|_| SearchboxError::PoolTimeout {
                    route: route.to_string(),
                    waited: timeout,
                })??,
            None => leasing.await?,
        };

        trace!(route = %route, "Connection leased");
        Ok(lease)
    }

    pub fn stats(&self) -> PoolStats {
        let (semaphore, max_total) = match self {
            Self::Basic(basic) => (&basic.connection, 1),
            Self::Pooling(pool) => (&pool.total, pool.limits.max_total),
        };
        let capacity = clamp(max_total);
        PoolStats {
            leased: capacity.saturating_sub(semaphore.available_permits()),
            max_total,
        }
    }
}

/// Snapshot of pool usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub leased: usize,
    pub max_total: usize,
}

/// Single-connection manager
#[derive(Debug)]
pub struct BasicConnectionManager {
    connection: Arc<Semaphore>,
}

impl BasicConnectionManager {
    pub fn new() -> Self {
        Self {
            connection: Arc::new(Semaphore::new(1)),
        }
    }
}

impl Default for BasicConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Sizing of a pooling manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolLimits {
    pub max_total: usize,
    pub default_max_per_route: usize,
    pub max_per_route: HashMap<Route, usize>,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            max_total: DEFAULT_MAX_TOTAL,
            default_max_per_route: DEFAULT_MAX_PER_ROUTE,
            max_per_route: HashMap::new(),
        }
    }
}

impl PoolLimits {
    fn cap_for(&self, route: &Route) -> usize {
        self.max_per_route
            .get(route)
            .copied()
            .unwrap_or(self.default_max_per_route)
    }
}

/// Pooled manager bounded by a global cap and per-route caps
#[derive(Debug)]
pub struct PoolingConnectionManager {
    limits: PoolLimits,
    total: Arc<Semaphore>,
    routes: DashMap<Route, Arc<Semaphore>>,
}

impl PoolingConnectionManager {
    pub fn new(limits: PoolLimits) -> Self {
        debug!(
            max_total = limits.max_total,
            default_max_per_route = limits.default_max_per_route,
            route_overrides = limits.max_per_route.len(),
            "Pooling connection manager created"
        );
        Self {
            total: Arc::new(Semaphore::new(clamp(limits.max_total))),
            routes: DashMap::new(),
            limits,
        }
    }

    pub fn limits(&self) -> &PoolLimits {
        &self.limits
    }

    async fn acquire(&self, route: &Route) -> SearchboxResult<Lease> {
        let route_semaphore = self
            .routes
            .entry(route.clone())
            .or_insert_with(|| Arc::new(Semaphore::new(clamp(self.limits.cap_for(route)))))
            .clone();

        let route_permit = acquire(&route_semaphore).await?;
        let total_permit = acquire(&self.total).await?;

        Ok(Lease {
            route: route.clone(),
            _route_permit: Some(route_permit),
            _total_permit: total_permit,
        })
    }
}

/// A leased connection slot, released on drop
#[derive(Debug)]
pub struct Lease {
    route: Route,
    _route_permit: Option<OwnedSemaphorePermit>,
    _total_permit: OwnedSemaphorePermit,
}

impl Lease {
    pub fn route(&self) -> &Route {
        &self.route
    }
}

async fn acquire(semaphore: &Arc<Semaphore>) -> SearchboxResult<OwnedSemaphorePermit> {
    semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| SearchboxError::engine(format!("Connection pool closed: {}", e)))
}

fn clamp(permits: usize) -> usize {
    permits.min(Semaphore::MAX_PERMITS)
}
