// Request/response body codecs

use crate::error::{SearchboxError, SearchboxResult};
use serde_json::Value;
use std::fmt::Debug;

/// Encodes request bodies and decodes response bodies.
///
/// A client uses [`JsonCodec`] unless its configuration supplies an
/// override, in which case every body goes through the override.
pub trait Codec: Debug + Send + Sync {
    fn encode(&self, value: &Value) -> SearchboxResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> SearchboxResult<Value>;

    fn content_type(&self) -> &str {
        "application/json"
    }
}

/// Default JSON codec
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec that pretty-prints request bodies
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> SearchboxResult<Vec<u8>> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };

        encoded.map_err(|e| SearchboxError::Codec {
            message: format!("Failed to encode body: {}", e),
            source: Some(Box::new(e)),
        })
    }

    fn decode(&self, bytes: &[u8]) -> SearchboxResult<Value> {
        serde_json::from_slice(bytes).map_err(|e| SearchboxError::Codec {
            message: format!("Failed to decode body: {}", e),
            source: Some(Box::new(e)),
        })
    }
}
