use std::{net::SocketAddr, time::Duration};

use axum::{
    Json, Router,
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
};
use serde_json::{Value, json};

use todo_backend::{
    config::HttpClientConfig,
    http_client::{HttpClientError, HttpClientRuntime, PooledHttpClient},
};

async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route(
            "/greeting",
            get(|| async {
                let mut headers = HeaderMap::new();
                headers.insert("keep-alive", HeaderValue::from_static("timeout=5, max=100"));
                (headers, Json(json!({ "message": "hello" })))
            }),
        )
        .route(
            "/short",
            get(|| async {
                let mut headers = HeaderMap::new();
                headers.insert("keep-alive", HeaderValue::from_static("timeout=0"));
                (headers, "bye")
            }),
        )
        .route("/plain", get(|| async { "plain" }))
        .route("/echo", post(|Json(body): Json<Value>| async move { Json(body) }))
        .route("/fail", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test server");
    });
    addr
}

fn config() -> HttpClientConfig {
    HttpClientConfig {
        request_timeout_ms: 200,
        connect_timeout_ms: 1_000,
        socket_timeout_ms: 2_000,
        ..HttpClientConfig::default()
    }
}

fn client(config: &HttpClientConfig) -> PooledHttpClient {
    PooledHttpClient::from_config(config).expect("client should build")
}

#[tokio::test]
async fn keep_alive_comes_from_response_header() {
    let addr = spawn_server().await;
    let client = client(&config());

    let response = client
        .get(&format!("http://{addr}/greeting"))
        .await
        .expect("request should succeed");

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.keep_alive, Duration::from_secs(5));
    assert_eq!(response.json::<Value>().expect("json body")["message"], "hello");

    let stats = client.manager().stats().expect("stats");
    assert_eq!((stats.routes, stats.leased), (1, 0));
    assert_eq!(client.manager().close_expired_connections().expect("sweep"), 0);
}

#[tokio::test]
async fn missing_keep_alive_header_uses_default() {
    let addr = spawn_server().await;
    let cfg = HttpClientConfig {
        default_keep_alive_ms: 1_500,
        ..config()
    };

    let response = client(&cfg)
        .get(&format!("http://{addr}/plain"))
        .await
        .expect("request should succeed");

    assert_eq!(response.text(), "plain");
    assert_eq!(response.keep_alive, Duration::from_millis(1_500));
}

#[tokio::test]
async fn json_helpers_round_trip_and_check_status() {
    let addr = spawn_server().await;
    let client = client(&config());

    let echoed: Value = client
        .post_json(&format!("http://{addr}/echo"), &json!({ "id": 7 }))
        .await
        .expect("echo should succeed");
    assert_eq!(echoed, json!({ "id": 7 }));

    let err = client
        .get_json::<Value>(&format!("http://{addr}/fail"))
        .await
        .expect_err("503 should surface as an error");
    assert!(matches!(err, HttpClientError::Status(StatusCode::SERVICE_UNAVAILABLE)));
}

#[tokio::test]
async fn exhausted_pool_times_out() {
    let addr = spawn_server().await;
    let cfg = HttpClientConfig {
        max_total_connections: 1,
        ..config()
    };
    let client = client(&cfg);
    let url = reqwest::Url::parse(&format!("http://{addr}/plain")).expect("valid url");
    let held = client.manager().lease(&url).await.expect("first lease");

    let err = client
        .get(url.as_str())
        .await
        .expect_err("second request should wait and time out");
    assert!(matches!(err, HttpClientError::PoolTimeout(_)));

    held.complete(Duration::from_secs(1));
    client.get(url.as_str()).await.expect("slot should be free again");
}

#[tokio::test]
async fn failed_request_expires_its_route() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    let client = client(&config());

    let err = client
        .get(&format!("http://{addr}/"))
        .await
        .expect_err("nothing is listening");
    assert!(matches!(err, HttpClientError::Request(_)));

    let stats = client.manager().stats().expect("stats");
    assert_eq!((stats.routes, stats.leased), (1, 0));
    assert_eq!(client.manager().close_expired_connections().expect("sweep"), 1);
}

#[tokio::test]
async fn runtime_reaps_expired_routes_and_closes_on_shutdown() {
    let addr = spawn_server().await;
    let cfg = HttpClientConfig {
        reaper_interval_ms: 20,
        ..config()
    };
    let runtime = HttpClientRuntime::start(&cfg).expect("runtime should start");
    let client = runtime.client().clone();

    client
        .get(&format!("http://{addr}/short"))
        .await
        .expect("request should succeed");

    let mut remaining = None;
    for _ in 0..50 {
        let routes = client.manager().stats().expect("stats").routes;
        remaining = Some(routes);
        if routes == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(remaining, Some(0));

    runtime.shutdown().await;
    let err = client
        .get(&format!("http://{addr}/plain"))
        .await
        .expect_err("closed pool should reject requests");
    assert!(matches!(err, HttpClientError::PoolClosed));
}
