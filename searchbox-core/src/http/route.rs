// Connection routes

use crate::error::{SearchboxError, SearchboxResult};
use reqwest::Url;
use std::fmt;

/// Destination of a pooled connection: scheme, host and port
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    scheme: String,
    host: String,
    port: u16,
}

impl Route {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into().to_ascii_lowercase(),
            host: host.into().to_ascii_lowercase(),
            port,
        }
    }

    /// Parse the route of a server or request URL.
    ///
    /// Missing ports resolve to the scheme default, so `http://a` and
    /// `http://a:80` name the same route.
    pub fn parse(url: &str) -> SearchboxResult<Self> {
        let parsed = Url::parse(url).map_err(|e| SearchboxError::invalid_route(url, e.to_string()))?;
        Self::from_url(&parsed)
    }

    pub fn from_url(url: &Url) -> SearchboxResult<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| SearchboxError::invalid_route(url.as_str(), "missing host"))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| SearchboxError::invalid_route(url.as_str(), "missing port"))?;

        Ok(Self::new(url.scheme(), host, port))
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}
