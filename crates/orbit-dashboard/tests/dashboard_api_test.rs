//! Dashboard integration tests.
//!
//! Runs the real axum server on an ephemeral port and drives it with
//! reqwest (REST) and tokio-tungstenite (WebSocket):
//! - Status, settings and trigger endpoints
//! - WebSocket sessions subscribing through the broadcaster
//! - Connection limiting

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use orbit_dashboard::{serve, AppState, DashboardConfig};
use orbit_realtime::{Broadcaster, RealtimeConfig};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

type WsClient = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Dashboard server bound to 127.0.0.1 on an ephemeral port.
struct TestServer {
    addr: SocketAddr,
    broadcaster: Broadcaster,
    shutdown: CancellationToken,
    http: reqwest::Client,
}

impl TestServer {
    async fn start(config: DashboardConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let broadcaster = Broadcaster::new(RealtimeConfig::default()).unwrap();
        let shutdown = CancellationToken::new();

        let state = AppState::new(broadcaster.clone(), config);
        tokio::spawn(serve(listener, state, shutdown.clone()));

        Self {
            addr,
            broadcaster,
            shutdown,
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn ws_url(&self, query: &str) -> String {
        format!("ws://{}/ws{}", self.addr, query)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.http.get(self.url(path)).send().await.unwrap()
    }

    async fn post(&self, path: &str, body: Option<Value>) -> reqwest::Response {
        let request = self.http.post(self.url(path));
        let request = match body {
            Some(body) => request.json(&body),
            None => request,
        };
        request.send().await.unwrap()
    }

    async fn status(&self) -> Value {
        self.get("/api/status").await.json().await.unwrap()
    }

    /// Poll `/api/status` until `predicate` holds.
    async fn wait_for_status(&self, predicate: impl Fn(&Value) -> bool) -> Value {
        timeout(Duration::from_secs(5), async {
            loop {
                let status = self.status().await;
                if predicate(&status) {
                    return status;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("status condition not reached")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        self.broadcaster.shutdown();
    }
}

async fn next_json(ws: &mut WsClient) -> Value {
    let frame = timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    })
    .await
    .expect("no message within timeout");
    serde_json::from_str(&frame).unwrap()
}

fn enabled_config() -> DashboardConfig {
    DashboardConfig {
        enabled: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_status_starts_idle() {
    let server = TestServer::start(enabled_config()).await;

    let status = server.status().await;
    assert_eq!(status["running"], false);
    assert_eq!(status["subscriberCount"], 0);
    assert_eq!(status["activeChannels"], json!([]));

    let connection: Value = server.get("/api/connection").await.json().await.unwrap();
    assert_eq!(connection["status"], "disconnected");
    assert_eq!(connection["messagesReceived"], 0);
}

#[tokio::test]
async fn test_settings_roundtrip_and_validation() {
    let server = TestServer::start(enabled_config()).await;

    let settings: Value = server.get("/api/settings").await.json().await.unwrap();
    assert_eq!(settings["alertThreshold"], 0.7);
    assert_eq!(settings["realTimeUpdates"], true);

    let response = server
        .post("/api/settings", Some(json!({ "alertThreshold": 0.9 })))
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["alertThreshold"], 0.9);
    // Untouched fields keep their values
    assert_eq!(updated["updateFrequency"], 10);

    let response = server
        .post("/api/settings", Some(json!({ "updateFrequency": 0 })))
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("updateFrequency"));

    let response = server
        .post("/api/settings", Some(json!({ "updateFrequency": u64::MAX })))
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::UNPROCESSABLE_ENTITY);

    // Rejected updates applied nothing
    assert_eq!(server.broadcaster.settings().update_frequency_seconds, 10);
    assert_eq!(server.broadcaster.settings().alert_threshold, 0.9);
}

#[tokio::test]
async fn test_trigger_endpoint() {
    let server = TestServer::start(enabled_config()).await;

    let response = server.post("/api/trigger/stats", None).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["channel"], "stats");
    assert_eq!(body["delivered"], 0);

    let response = server.post("/api/trigger/telemetry", None).await;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metrics_exposed() {
    let server = TestServer::start(enabled_config()).await;
    server.post("/api/trigger/alerts", None).await;

    let response = server.get("/metrics").await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let text = response.text().await.unwrap();
    assert!(text.contains("orbit_emissions_total"));
}

#[tokio::test]
async fn test_ws_session_subscribes_and_streams() {
    let server = TestServer::start(enabled_config()).await;

    let (mut ws, _) = connect_async(server.ws_url("?channels=stats"))
        .await
        .unwrap();

    let welcome = next_json(&mut ws).await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["channels"], json!(["stats"]));

    // The session's subscription starts the broadcaster
    let status = server
        .wait_for_status(|s| s["subscriberCount"] == 1)
        .await;
    assert_eq!(status["running"], true);
    assert_eq!(status["activeChannels"], json!(["stats"]));

    let response = server.post("/api/trigger/stats", None).await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["delivered"], 1);

    let emission = next_json(&mut ws).await;
    assert_eq!(emission["type"], "emission");
    assert_eq!(emission["payload"]["channel"], "stats");
    assert!(emission["payload"]["data"]["totalObjects"].as_u64().is_some());

    // Closing the session unsubscribes and idles the broadcaster
    ws.send(Message::Close(None)).await.unwrap();
    let status = server.wait_for_status(|s| s["running"] == false).await;
    assert_eq!(status["subscriberCount"], 0);
}

#[tokio::test]
async fn test_ws_unknown_channel_rejected() {
    let server = TestServer::start(enabled_config()).await;
    let result = connect_async(server.ws_url("?channels=alerts,debris")).await;
    assert!(result.is_err());
    assert!(!server.broadcaster.is_running());
}

#[tokio::test]
async fn test_ws_connection_limit() {
    let server = TestServer::start(DashboardConfig {
        max_connections: 1,
        ..enabled_config()
    })
    .await;

    let (mut first, _) = connect_async(server.ws_url("?channels=alerts"))
        .await
        .unwrap();
    next_json(&mut first).await;

    let second = connect_async(server.ws_url("?channels=alerts")).await;
    assert!(second.is_err());

    // Slot frees once the first session closes
    first.send(Message::Close(None)).await.unwrap();
    server.wait_for_status(|s| s["subscriberCount"] == 0).await;
    let third = timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(conn) = connect_async(server.ws_url("?channels=alerts")).await {
                return conn;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    assert!(third.is_ok());
}
