//! NatsTransport against a live server.
//!
//! Run with a server available:
//! `NATS_URL=nats://127.0.0.1:4222 cargo test -p events-bus --features nats -- --ignored`
#![cfg(feature = "nats")]

use events_bus::{handler_fn, EventBusError, Message, NatsTransport, Reply, Transport};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

async fn connect() -> NatsTransport {
    let url = std::env::var("NATS_URL").unwrap_or_else(|_| "nats://127.0.0.1:4222".to_string());
    NatsTransport::connect(&url).await.unwrap()
}

/// Subject no other test run is listening on
fn unique_address(prefix: &str) -> String {
    format!("{}.{}", prefix, Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore = "requires a NATS server at NATS_URL"]
async fn test_request_reply_round_trip() {
    let transport = connect().await;
    let address = unique_address("noun.service");

    transport
        .register(
            &address,
            handler_fn(|message: Message| async move {
                Reply::ok(message.id, json!({ "action": message.action, "echo": message.payload }))
            }),
        )
        .await
        .unwrap();
    // Subscription must reach the server before the first request
    tokio::time::sleep(Duration::from_millis(100)).await;

    let message = Message::new(&address, "get", json!({"value": "idiot"}));
    let id = message.id;
    let reply = transport.request(&address, message, Duration::from_secs(2)).await.unwrap();

    assert_eq!(reply.correlation_id, id);
    assert_eq!(
        reply.into_result(),
        Ok(json!({ "action": "get", "echo": {"value": "idiot"} }))
    );
}

#[tokio::test]
#[ignore = "requires a NATS server at NATS_URL"]
async fn test_no_responders_is_no_handler() {
    let transport = connect().await;
    let address = unique_address("nobody.home");

    let result = transport
        .request(&address, Message::new(&address, "get", json!(null)), Duration::from_secs(2))
        .await;

    assert_eq!(result, Err(EventBusError::NoHandler(address)));
}

#[tokio::test]
#[ignore = "requires a NATS server at NATS_URL"]
async fn test_slow_handler_times_out() {
    let transport = connect().await;
    let address = unique_address("slow.service");

    transport
        .register(
            &address,
            handler_fn(|message: Message| async move {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Reply::ok(message.id, json!(null))
            }),
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let result = transport
        .request(&address, Message::new(&address, "get", json!(null)), Duration::from_millis(200))
        .await;

    assert_eq!(
        result,
        Err(EventBusError::Timeout {
            address,
            timeout_ms: 200
        })
    );
}

#[tokio::test]
#[ignore = "requires a NATS server at NATS_URL"]
async fn test_unregister_stops_replies() {
    let transport = connect().await;
    let address = unique_address("leaving.service");

    let registration = transport
        .register(&address, handler_fn(|message: Message| async move { Reply::ok(message.id, json!(true)) }))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(transport
        .request(&address, Message::new(&address, "healthCheck", json!(null)), Duration::from_secs(2))
        .await
        .is_ok());

    transport.unregister(&registration).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let result = transport
        .request(&address, Message::new(&address, "healthCheck", json!(null)), Duration::from_millis(500))
        .await;
    assert!(result.is_err());
}
