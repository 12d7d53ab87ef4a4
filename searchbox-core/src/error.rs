// 🟢 GREEN Phase: Error handling for client construction and execution

use std::time::Duration;
use thiserror::Error;

/// Type alias for searchbox results
pub type SearchboxResult<T> = Result<T, SearchboxError>;

#[derive(Debug, Error)]
pub enum SearchboxError {
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Timeout waiting for connection to {route} after {waited:?}")]
    PoolTimeout {
        route: String,
        waited: Duration,
    },

    #[error("HTTP engine error: {message}")]
    Engine {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },

    #[error("Invalid route {url}: {message}")]
    InvalidRoute {
        url: String,
        message: String,
    },

    #[error("No servers available to execute request")]
    NoServers,

    #[error("Codec error: {message}")]
    Codec {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Discovery error: {message}")]
    Discovery {
        message: String,
    },
}

impl SearchboxError {
    /// Create an engine construction error
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid route error
    pub fn invalid_route(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRoute {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a discovery error
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    /// Map a transport error from the HTTP engine
    pub fn from_transport(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("Request timeout: {}", err)
        } else if err.is_connect() {
            format!("Connection failed: {}", err)
        } else {
            format!("Network error: {}", err)
        };

        Self::Network {
            message,
            source: Some(Box::new(err)),
        }
    }

    /// Whether a socket timeout or a wait for a pooled connection expired
    pub fn is_timeout(&self) -> bool {
        match self {
            SearchboxError::Network { message, .. } => {
                message.contains("timeout") || message.contains("Timeout")
            }
            SearchboxError::PoolTimeout { .. } => true,
            _ => false,
        }
    }
}
