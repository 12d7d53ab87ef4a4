// Client configuration

use crate::codec::Codec;
use crate::error::{SearchboxError, SearchboxResult};
use crate::http::Route;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Interval between node discovery cycles unless configured
pub const DEFAULT_DISCOVERY_FREQUENCY: Duration = Duration::from_secs(10);

/// Client configuration consumed by [`ClientFactory`](crate::factory::ClientFactory)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URLs, in preference order
    pub servers: Vec<String>,
    /// How long to wait for a connection from the pool
    pub conn_timeout: Duration,
    /// Socket read timeout
    pub read_timeout: Duration,
    /// Use a pooled connection manager instead of a single connection
    pub multi_threaded: bool,
    /// Global pool cap
    pub max_total_connection: Option<usize>,
    /// Default per-route pool cap
    pub default_max_total_connection_per_route: Option<usize>,
    /// Explicit per-route pool caps
    pub max_total_connection_per_route: HashMap<Route, usize>,
    /// Start node discovery when the client is built
    pub discovery_enabled: bool,
    /// Interval between discovery cycles
    pub discovery_frequency: Duration,
    /// Node filter for the nodes info call, `_all` when unset
    pub discovery_filter: Option<String>,
    /// Body codec override
    pub codec: Option<Arc<dyn Codec>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            conn_timeout: Duration::from_millis(3000),
            read_timeout: Duration::from_millis(3000),
            multi_threaded: false,
            max_total_connection: None,
            default_max_total_connection_per_route: None,
            max_total_connection_per_route: HashMap::new(),
            discovery_enabled: false,
            discovery_frequency: DEFAULT_DISCOVERY_FREQUENCY,
            discovery_filter: None,
            codec: None,
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Load configuration from `SEARCHBOX_*` environment variables
    pub fn from_env() -> SearchboxResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> SearchboxResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(servers) = lookup("SEARCHBOX_SERVERS") {
            builder = builder.servers(
                servers
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
            );
        }
        if let Some(ms) = parse_key::<u64, _>(&lookup, "SEARCHBOX_CONN_TIMEOUT_MS")? {
            builder = builder.conn_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = parse_key::<u64, _>(&lookup, "SEARCHBOX_READ_TIMEOUT_MS")? {
            builder = builder.read_timeout(Duration::from_millis(ms));
        }
        if let Some(flag) = parse_key::<bool, _>(&lookup, "SEARCHBOX_MULTI_THREADED")? {
            builder = builder.multi_threaded(flag);
        }
        if let Some(max) = parse_key::<usize, _>(&lookup, "SEARCHBOX_MAX_TOTAL_CONNECTION")? {
            builder = builder.max_total_connection(max);
        }
        if let Some(max) = parse_key::<usize, _>(&lookup, "SEARCHBOX_DEFAULT_MAX_PER_ROUTE")? {
            builder = builder.default_max_total_connection_per_route(max);
        }
        if let Some(flag) = parse_key::<bool, _>(&lookup, "SEARCHBOX_DISCOVERY_ENABLED")? {
            builder = builder.discovery_enabled(flag);
        }
        if let Some(ms) = parse_key::<u64, _>(&lookup, "SEARCHBOX_DISCOVERY_FREQUENCY_MS")? {
            builder = builder.discovery_frequency(Duration::from_millis(ms));
        }

        Ok(builder.build())
    }
}

fn parse_key<T, F>(lookup: &F, key: &str) -> SearchboxResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| SearchboxError::config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(None),
    }
}

/// Client configuration builder
#[derive(Default)]
pub struct ClientConfigBuilder {
    servers: Vec<String>,
    conn_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    multi_threaded: Option<bool>,
    max_total_connection: Option<usize>,
    default_max_total_connection_per_route: Option<usize>,
    max_total_connection_per_route: HashMap<Route, usize>,
    discovery_enabled: Option<bool>,
    discovery_frequency: Option<Duration>,
    discovery_filter: Option<String>,
    codec: Option<Arc<dyn Codec>>,
}

impl ClientConfigBuilder {
    /// Add a single server
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.servers.push(server.into());
        self
    }

    /// Add several servers
    pub fn servers<I, S>(mut self, servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.servers.extend(servers.into_iter().map(Into::into));
        self
    }

    /// Set connection request timeout
    pub fn conn_timeout(mut self, timeout: Duration) -> Self {
        self.conn_timeout = Some(timeout);
        self
    }

    /// Set socket read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn multi_threaded(mut self, multi_threaded: bool) -> Self {
        self.multi_threaded = Some(multi_threaded);
        self
    }

    pub fn max_total_connection(mut self, max: usize) -> Self {
        self.max_total_connection = Some(max);
        self
    }

    pub fn default_max_total_connection_per_route(mut self, max: usize) -> Self {
        self.default_max_total_connection_per_route = Some(max);
        self
    }

    /// Set an explicit cap for one route
    pub fn max_total_connection_per_route(mut self, route: Route, max: usize) -> Self {
        self.max_total_connection_per_route.insert(route, max);
        self
    }

    pub fn discovery_enabled(mut self, enabled: bool) -> Self {
        self.discovery_enabled = Some(enabled);
        self
    }

    pub fn discovery_frequency(mut self, frequency: Duration) -> Self {
        self.discovery_frequency = Some(frequency);
        self
    }

    pub fn discovery_filter(mut self, filter: impl Into<String>) -> Self {
        self.discovery_filter = Some(filter.into());
        self
    }

    /// Override the body codec
    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        let default = ClientConfig::default();
        ClientConfig {
            servers: self.servers,
            conn_timeout: self.conn_timeout.unwrap_or(default.conn_timeout),
            read_timeout: self.read_timeout.unwrap_or(default.read_timeout),
            multi_threaded: self.multi_threaded.unwrap_or(default.multi_threaded),
            max_total_connection: self.max_total_connection,
            default_max_total_connection_per_route: self.default_max_total_connection_per_route,
            max_total_connection_per_route: self.max_total_connection_per_route,
            discovery_enabled: self.discovery_enabled.unwrap_or(default.discovery_enabled),
            discovery_frequency: self.discovery_frequency.unwrap_or(default.discovery_frequency),
            discovery_filter: self.discovery_filter,
            codec: self.codec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = ClientConfig::builder().server("http://a:9200").build();
        assert_eq!(config.servers, vec!["http://a:9200"]);
        assert_eq!(config.conn_timeout, Duration::from_millis(3000));
        assert_eq!(config.read_timeout, Duration::from_millis(3000));
        assert!(!config.multi_threaded);
        assert!(!config.discovery_enabled);
        assert!(config.max_total_connection.is_none());
        assert!(config.codec.is_none());
    }

    #[test]
    fn test_from_lookup() {
        let env: HashMap<&str, &str> = [
            ("SEARCHBOX_SERVERS", "http://a:9200, http://b:9200,"),
            ("SEARCHBOX_CONN_TIMEOUT_MS", "1500"),
            ("SEARCHBOX_MULTI_THREADED", "true"),
            ("SEARCHBOX_MAX_TOTAL_CONNECTION", "40"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.servers, vec!["http://a:9200", "http://b:9200"]);
        assert_eq!(config.conn_timeout, Duration::from_millis(1500));
        assert_eq!(config.read_timeout, Duration::from_millis(3000));
        assert!(config.multi_threaded);
        assert_eq!(config.max_total_connection, Some(40));
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers() {
        let err = ClientConfig::from_lookup(|k| {
            (k == "SEARCHBOX_READ_TIMEOUT_MS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, SearchboxError::Config { .. }));
    }
}
