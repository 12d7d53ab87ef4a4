// Shared helpers for integration tests against a mock cluster

#![allow(dead_code)]

use searchbox_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use serde_json::{json, Value};
use std::sync::Once;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        let config = LogConfig::builder()
            .level(LogLevel::Debug)
            .format(LogFormat::Plain)
            .build();
        // another test binary may already own the global subscriber
        let _ = init_logging(config);
    });
}

/// Nodes info body publishing each of `addresses` as an HTTP node
pub fn nodes_info_body(addresses: &[String]) -> Value {
    let nodes: serde_json::Map<String, Value> = addresses
        .iter()
        .enumerate()
        .map(|(i, address)| {
            (
                format!("node-{}", i),
                json!({"name": format!("es-{}", i), "http": {"publish_address": address}}),
            )
        })
        .collect();
    json!({"cluster_name": "test", "nodes": nodes})
}

/// Mock cluster whose nodes info lists the mock itself
pub async fn self_discovering_cluster() -> MockServer {
    let server = MockServer::start().await;
    let address = server.address().to_string();

    Mock::given(method("GET"))
        .and(path("/_nodes/_all/http"))
        .respond_with(ResponseTemplate::new(200).set_body_json(nodes_info_body(&[address])))
        .mount(&server)
        .await;

    server
}
