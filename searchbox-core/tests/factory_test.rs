// Client factory resolution tests

mod common;

use pretty_assertions::assert_eq;
use searchbox_core::factory::{ClientFactory, DEFAULT_SERVER};
use searchbox_core::http::{RequestConfig, Route, DEFAULT_MAX_PER_ROUTE};
use searchbox_core::ClientConfig;
use std::time::Duration;

#[tokio::test]
async fn test_absent_config_uses_localhost_and_basic_manager() {
    common::init_test_logging();

    let client = ClientFactory::new(None).build().await.expect("default client");

    assert_eq!(client.servers(), vec![DEFAULT_SERVER.to_string()]);
    assert_eq!(client.servers(), vec!["http://localhost:9200".to_string()]);
    assert!(!client.connection_manager().is_pooled());
    assert_eq!(client.request_config(), RequestConfig::default());
    assert!(client.node_checker().is_none());
    assert!(client.async_engine().connection_manager().is_pooled());
}

#[tokio::test]
async fn test_pooled_scenario_with_global_cap() {
    let config = ClientConfig::builder()
        .servers(["http://a:9200", "http://b:9200"])
        .conn_timeout(Duration::from_millis(3000))
        .read_timeout(Duration::from_millis(5000))
        .multi_threaded(true)
        .max_total_connection(50)
        .discovery_enabled(false)
        .build();

    let client = ClientFactory::with_config(config).build().await.unwrap();

    assert_eq!(client.servers(), vec!["http://a:9200", "http://b:9200"]);
    let manager = client.connection_manager();
    assert!(manager.is_pooled());
    assert_eq!(manager.max_total(), 50);
    assert_eq!(manager.default_max_per_route(), DEFAULT_MAX_PER_ROUTE);
    assert_eq!(
        client.request_config(),
        RequestConfig {
            connection_request_timeout: Some(Duration::from_millis(3000)),
            socket_timeout: Some(Duration::from_millis(5000)),
        }
    );
    assert!(client.node_checker().is_none());
}

#[tokio::test]
async fn test_single_threaded_never_applies_caps() {
    let route = Route::parse("http://a:9200").unwrap();
    let config = ClientConfig::builder()
        .server("http://a:9200")
        .multi_threaded(false)
        .max_total_connection(0)
        .default_max_total_connection_per_route(100)
        .max_total_connection_per_route(route.clone(), 40)
        .build();

    let client = ClientFactory::with_config(config).build().await.unwrap();
    let manager = client.connection_manager();

    assert!(!manager.is_pooled());
    assert_eq!(manager.max_total(), 1);
    assert_eq!(manager.max_per_route(&route), 1);
}

#[tokio::test]
async fn test_route_override_beats_default_per_route() {
    let hot = Route::parse("http://hot:9200").unwrap();
    let config = ClientConfig::builder()
        .server("http://hot:9200")
        .multi_threaded(true)
        .default_max_total_connection_per_route(3)
        .max_total_connection_per_route(hot.clone(), 12)
        .build();

    let client = ClientFactory::with_config(config).build().await.unwrap();

    assert_eq!(client.connection_manager().max_per_route(&hot), 12);
    assert_eq!(
        client
            .connection_manager()
            .max_per_route(&Route::parse("http://other:9200").unwrap()),
        3
    );
}

#[tokio::test]
async fn test_duplicate_servers_collapse() {
    let config = ClientConfig::builder()
        .servers(["http://b:9200", "http://a:9200", "http://b:9200", "http://a:9200"])
        .build();

    let client = ClientFactory::with_config(config).build().await.unwrap();
    assert_eq!(client.servers(), vec!["http://b:9200", "http://a:9200"]);
}

#[tokio::test]
async fn test_building_twice_gives_independent_handles() {
    let config = ClientConfig::builder()
        .servers(["http://a:9200", "http://b:9200"])
        .conn_timeout(Duration::from_millis(700))
        .read_timeout(Duration::from_millis(900))
        .multi_threaded(true)
        .build();
    let factory = ClientFactory::with_config(config);

    let first = factory.build().await.unwrap();
    let second = factory.build().await.unwrap();

    assert_eq!(first.servers(), second.servers());
    assert_eq!(first.request_config(), second.request_config());
    assert!(!std::ptr::eq(first.connection_manager(), second.connection_manager()));

    first.core().set_servers(["http://c:9200"]);
    assert_eq!(second.servers(), vec!["http://a:9200", "http://b:9200"]);
}

#[tokio::test]
async fn test_set_config_after_construction() {
    let mut factory = ClientFactory::default();
    assert!(factory.config().is_none());

    factory.set_config(ClientConfig::builder().server("http://x:9200").build());
    let client = factory.build().await.unwrap();
    assert_eq!(client.servers(), vec!["http://x:9200"]);
}
