//! HTTP-backed noun service against mocked and hand-rolled backends

use error_common::Failure;
use noun_service::{NounRecord, NounService, NounServiceConfig, NounServiceImpl};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn config_for(host_with_port: &str) -> NounServiceConfig {
    let (host, port) = host_with_port.rsplit_once(':').unwrap();
    NounServiceConfig::new(host, port.parse().unwrap())
}

fn service_for(server: &mockito::ServerGuard) -> NounServiceImpl {
    NounServiceImpl::new(config_for(&server.host_with_port())).unwrap()
}

/// Serves exactly one connection with a fixed raw response
async fn raw_backend(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });
    addr
}

/// Accepts connections and never answers
async fn hanging_backend() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

#[tokio::test]
async fn test_get_returns_record_on_200() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/noun")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"value": "idiot"}).to_string())
        .create_async()
        .await;

    let result = service_for(&server).get().await;

    assert_eq!(result, Ok(NounRecord::new("idiot")));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_uses_path_base() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/insults/api/v1/noun")
        .with_status(200)
        .with_body(r#"{"value": "lout"}"#)
        .create_async()
        .await;

    let mut config = config_for(&server.host_with_port());
    config.path_base = "/insults".to_string();
    let result = NounServiceImpl::new(config).unwrap().get().await;

    assert_eq!(result, Ok(NounRecord::new("lout")));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_non_200_fails_with_status_message() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/api/v1/noun").with_status(503).create_async().await;

    let result = service_for(&server).get().await;

    assert_eq!(result, Err(Failure::new("Service Unavailable")));
}

#[tokio::test]
async fn test_get_other_success_codes_are_failures() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v1/noun")
        .with_status(204)
        .create_async()
        .await;

    let result = service_for(&server).get().await;

    assert_eq!(result, Err(Failure::new("No Content")));
}

#[tokio::test]
async fn test_get_keeps_server_reason_phrase() {
    let addr = raw_backend("HTTP/1.1 503 unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n").await;
    let service = NounServiceImpl::new(config_for(&addr)).unwrap();

    assert_eq!(service.get().await, Err(Failure::new("unavailable")));
}

#[tokio::test]
async fn test_get_empty_reason_phrase_falls_back_to_canonical() {
    let addr = raw_backend("HTTP/1.1 503 \r\ncontent-length: 0\r\nconnection: close\r\n\r\n").await;
    let service = NounServiceImpl::new(config_for(&addr)).unwrap();

    assert_eq!(service.get().await, Err(Failure::new("Service Unavailable")));
}

#[tokio::test]
async fn test_get_unknown_status_without_reason_uses_code() {
    let addr = raw_backend("HTTP/1.1 599 \r\ncontent-length: 0\r\nconnection: close\r\n\r\n").await;
    let service = NounServiceImpl::new(config_for(&addr)).unwrap();

    assert_eq!(service.get().await, Err(Failure::new("599")));
}

#[tokio::test]
async fn test_get_malformed_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/v1/noun")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let failure = service_for(&server).get().await.unwrap_err();

    assert!(failure.reason.starts_with("malformed response body: "), "{}", failure);
}

#[tokio::test]
async fn test_get_connection_refused() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let failure = NounServiceImpl::new(config_for(&addr)).unwrap().get().await.unwrap_err();

    assert!(!failure.reason.is_empty());
    assert!(!failure.is_timeout());
}

#[tokio::test]
async fn test_get_times_out() {
    let addr = hanging_backend().await;
    let mut config = config_for(&addr);
    config.timeout_ms = 200;
    let service = NounServiceImpl::new(config).unwrap();

    let started = Instant::now();
    let result = service.get().await;

    assert_eq!(result, Err(Failure::timeout()));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_get_with_explicit_timeout() {
    let addr = hanging_backend().await;
    let service = NounServiceImpl::new(config_for(&addr)).unwrap();

    let result = service.get_with_timeout(Duration::from_millis(100)).await;

    assert_eq!(result, Err(Failure::timeout()));
}

#[tokio::test]
async fn test_save_not_implemented() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;

    let result = service_for(&server).save(NounRecord::new("varlet")).await;

    assert_eq!(result, Err(Failure::not_implemented()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_health_check_healthy() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/health").with_status(200).create_async().await;

    assert_eq!(service_for(&server).health_check().await, Ok(true));
}

#[tokio::test]
async fn test_health_check_unhealthy_status() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/health").with_status(500).create_async().await;

    assert_eq!(service_for(&server).health_check().await, Ok(false));
}

#[tokio::test]
async fn test_health_check_unreachable_is_false() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);

    let service = NounServiceImpl::new(config_for(&addr)).unwrap();

    assert_eq!(service.health_check().await, Ok(false));
}

#[tokio::test]
async fn test_health_check_bounded_by_timeout() {
    let addr = hanging_backend().await;
    let mut config = config_for(&addr);
    config.timeout_ms = 200;
    let service = NounServiceImpl::new(config).unwrap();

    let started = Instant::now();
    assert_eq!(service.health_check().await, Ok(false));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_health_check_result_is_cached() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let service = service_for(&server);
    let (first, second) = tokio::join!(service.health_check(), service.health_check());
    let third = service.health_check().await;

    assert_eq!((first, second, third), (Ok(true), Ok(true), Ok(true)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_health_check_uncached_when_ttl_zero() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .with_status(200)
        .expect(2)
        .create_async()
        .await;

    let mut config = config_for(&server.host_with_port());
    config.health_cache_ttl_ms = 0;
    let service = NounServiceImpl::new(config).unwrap();

    service.health_check().await.unwrap();
    service.health_check().await.unwrap();
    mock.assert_async().await;
}
