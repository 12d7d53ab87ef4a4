// Nodes info API as a discovery source

use super::NodeSource;
use crate::action::Action;
use crate::client::ClientCore;
use crate::error::{SearchboxError, SearchboxResult};
use async_trait::async_trait;
use serde_json::Value;

/// Discovers nodes through `GET /_nodes/{filter}/http`
#[derive(Debug, Clone)]
pub struct NodesInfoSource {
    filter: String,
    scheme: String,
}

impl NodesInfoSource {
    pub fn new(filter: Option<String>) -> Self {
        Self {
            filter: filter.unwrap_or_else(|| "_all".to_string()),
            scheme: "http".to_string(),
        }
    }

    /// Scheme used for discovered addresses
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    fn servers_from(&self, body: &Value) -> Vec<String> {
        let Some(nodes) = body.get("nodes").and_then(Value::as_object) else {
            return Vec::new();
        };

        nodes
            .values()
            .filter_map(|node| {
                node.pointer("/http/publish_address")
                    .or_else(|| node.get("http_address"))
                    .and_then(Value::as_str)
            })
            .filter_map(parse_publish_address)
            .map(|address| format!("{}://{}", self.scheme, address))
            .collect()
    }
}

#[async_trait]
impl NodeSource for NodesInfoSource {
    async fn discover(&self, core: &ClientCore) -> SearchboxResult<Vec<String>> {
        let action = Action::get(format!("/_nodes/{}/http", self.filter));
        let result = core.execute(&action).await?;

        if !result.is_succeeded() {
            return Err(SearchboxError::discovery(format!(
                "Nodes info request failed: {}",
                result.error_message().unwrap_or_default()
            )));
        }

        let body = result
            .json()
            .ok_or_else(|| SearchboxError::discovery("Nodes info response is not JSON"))?;
        Ok(self.servers_from(body))
    }
}

/// Extract `host:port` from a published HTTP address.
///
/// Accepts `ip:port`, `hostname/ip:port` and the legacy `inet[/ip:port]`.
pub fn parse_publish_address(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let raw = raw
        .strip_prefix("inet[")
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(raw);
    let address = raw.rsplit_once('/').map(|(_, address)| address).unwrap_or(raw);

    let (host, port) = address.rsplit_once(':')?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return None;
    }
    Some(address.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_publish_address_forms() {
        assert_eq!(parse_publish_address("10.0.0.1:9200").as_deref(), Some("10.0.0.1:9200"));
        assert_eq!(parse_publish_address("es-1/10.0.0.1:9200").as_deref(), Some("10.0.0.1:9200"));
        assert_eq!(parse_publish_address("inet[/10.0.0.2:9201]").as_deref(), Some("10.0.0.2:9201"));
        assert_eq!(parse_publish_address("[::1]:9200").as_deref(), Some("[::1]:9200"));
        assert_eq!(parse_publish_address("no-port"), None);
        assert_eq!(parse_publish_address(":9200"), None);
    }

    #[test]
    fn test_servers_from_nodes_info() {
        let body = json!({
            "nodes": {
                "a": {"http": {"publish_address": "10.0.0.1:9200"}},
                "b": {"http_address": "inet[/10.0.0.2:9200]"},
                "c": {"name": "no-http"}
            }
        });
        let mut servers = NodesInfoSource::new(None).servers_from(&body);
        servers.sort();
        assert_eq!(servers, vec!["http://10.0.0.1:9200", "http://10.0.0.2:9200"]);
    }

    #[test]
    fn test_filter_and_scheme() {
        let source = NodesInfoSource::new(Some("data:true".to_string())).with_scheme("https");
        assert_eq!(source.filter(), "data:true");
        let body = json!({"nodes": {"a": {"http": {"publish_address": "10.0.0.1:9200"}}}});
        assert_eq!(source.servers_from(&body), vec!["https://10.0.0.1:9200"]);
    }
}
