// Actions executed against the cluster and their results

use crate::error::{SearchboxError, SearchboxResult};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

/// A single REST call, described relative to a server base URL
#[derive(Debug, Clone)]
pub struct Action {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

impl Action {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Method::HEAD, path)
    }

    /// Add a header to the request
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Add query parameters, skipping (with a warning) any that do not
    /// serialize to flat key/value pairs
    pub fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Self {
        match encode_query(params) {
            Ok(pairs) => self.query.extend(pairs),
            Err(e) => warn!(error = %e, "Dropping query parameters"),
        }
        self
    }

    /// Add query parameters, failing if they do not serialize to flat
    /// key/value pairs
    pub fn try_query<T: Serialize + ?Sized>(mut self, params: &T) -> SearchboxResult<Self> {
        self.query.extend(encode_query(params)?);
        Ok(self)
    }

    /// Set JSON body
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn json_body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Full URL of this action against `server`
    pub fn url_for(&self, server: &str) -> String {
        let server = server.trim_end_matches('/');
        if self.path.is_empty() {
            server.to_string()
        } else if self.path.starts_with('/') {
            format!("{}{}", server, self.path)
        } else {
            format!("{}/{}", server, self.path)
        }
    }
}

fn encode_query<T: Serialize + ?Sized>(params: &T) -> SearchboxResult<Vec<(String, String)>> {
    let encoding_failed = |e: Box<dyn std::error::Error + Send + Sync>| SearchboxError::Codec {
        message: format!("Failed to encode query parameters: {}", e),
        source: Some(e),
    };
    let serialized = serde_urlencoded::to_string(params).map_err(|e| encoding_failed(Box::new(e)))?;
    serde_urlencoded::from_str(&serialized).map_err(|e| encoding_failed(Box::new(e)))
}

/// Outcome of an executed action
#[derive(Debug, Clone)]
pub struct ActionResult {
    status: u16,
    body: String,
    json: Option<Value>,
}

impl ActionResult {
    pub fn new(status: u16, body: String, json: Option<Value>) -> Self {
        Self { status, body, json }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_succeeded(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Error reported by the cluster, if any.
    ///
    /// Elasticsearch reports `error` either as a string or as an object
    /// carrying a `reason`.
    pub fn error_message(&self) -> Option<String> {
        if self.is_succeeded() {
            return None;
        }
        match self.json.as_ref().and_then(|json| json.get("error")) {
            Some(Value::String(message)) => Some(message.clone()),
            Some(error) => error
                .get("reason")
                .and_then(Value::as_str)
                .map(String::from)
                .or_else(|| Some(error.to_string())),
            None => Some(format!("{} {}", self.status, self.body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_joining() {
        assert_eq!(Action::get("/_search").url_for("http://a:9200/"), "http://a:9200/_search");
        assert_eq!(Action::get("twitter/_doc/1").url_for("http://a:9200"), "http://a:9200/twitter/_doc/1");
        assert_eq!(Action::get("").url_for("http://a:9200"), "http://a:9200");
    }

    #[test]
    fn test_query_parameters() {
        let action = Action::get("/_search").query(&[("size", "10"), ("q", "user:kimchy")]);
        assert_eq!(
            action.query_pairs(),
            &[
                ("size".to_string(), "10".to_string()),
                ("q".to_string(), "user:kimchy".to_string())
            ]
        );
    }

    #[test]
    fn test_nested_query_values_are_rejected() {
        let action = Action::get("/_mget").query(&[("size", "1")]);

        let err = action.clone().try_query(&[("ids", vec![1, 2])]).unwrap_err();
        assert!(matches!(err, SearchboxError::Codec { .. }));
        assert!(err.to_string().contains("query parameters"));

        let kept = action.query(&[("ids", vec![1, 2])]);
        assert_eq!(kept.query_pairs(), &[("size".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_error_message_forms() {
        let reason = ActionResult::new(
            404,
            String::new(),
            Some(json!({"error": {"type": "index_not_found_exception", "reason": "no such index"}})),
        );
        assert_eq!(reason.error_message().as_deref(), Some("no such index"));

        let plain = ActionResult::new(400, String::new(), Some(json!({"error": "bad request"})));
        assert_eq!(plain.error_message().as_deref(), Some("bad request"));

        let ok = ActionResult::new(200, "{}".to_string(), Some(json!({})));
        assert!(ok.is_succeeded());
        assert_eq!(ok.error_message(), None);
    }
}
