//! HTTP server implementation using axum.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use futures_util::stream::StreamExt;
use futures_util::SinkExt;
use orbit_core::{ChannelName, ConnectionState, Settings, SettingsUpdate};
use orbit_realtime::{Broadcaster, SubscriberError, SubscriptionHandle, SystemStatus};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::types::{DashboardMessage, TriggerResponse, WsQuery};

/// Caps concurrent WebSocket sessions.
pub struct ConnectionLimiter {
    current: AtomicUsize,
    max: usize,
}

impl ConnectionLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max,
        }
    }

    /// Reserve a slot. The slot is held until the guard is dropped.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionGuard> {
        loop {
            let current = self.current.load(Ordering::Acquire);
            if current >= self.max {
                return None;
            }
            if self
                .current
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(ConnectionGuard {
                    limiter: Arc::clone(self),
                });
            }
        }
    }

    pub fn current_count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}

/// Held for the lifetime of one WebSocket session.
pub struct ConnectionGuard {
    limiter: Arc<ConnectionLimiter>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.limiter.current.fetch_sub(1, Ordering::Release);
    }
}

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    broadcaster: Broadcaster,
    connection_limiter: Arc<ConnectionLimiter>,
    config: DashboardConfig,
    metrics_enabled: bool,
}

impl AppState {
    pub fn new(broadcaster: Broadcaster, config: DashboardConfig) -> Self {
        Self {
            broadcaster,
            connection_limiter: Arc::new(ConnectionLimiter::new(config.max_connections)),
            config,
            metrics_enabled: true,
        }
    }

    /// Serve or hide `/metrics`.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/settings", get(get_settings).post(post_settings))
        .route("/api/connection", get(get_connection))
        .route("/api/trigger/{channel}", post(post_trigger))
        .route("/api/refresh", post(post_refresh))
        .route("/api/reconnect", post(post_reconnect))
        .route("/metrics", get(get_metrics))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(state.broadcaster.system_status())
}

async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.broadcaster.settings())
}

async fn post_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> DashboardResult<Json<Settings>> {
    let settings = state
        .broadcaster
        .update_settings(update)
        .map_err(|e| DashboardError::InvalidSettings(e.to_string()))?;
    Ok(Json(settings))
}

async fn get_connection(State(state): State<AppState>) -> Json<ConnectionState> {
    Json(state.broadcaster.connection_status())
}

async fn post_trigger(
    State(state): State<AppState>,
    Path(channel): Path<String>,
) -> DashboardResult<Json<TriggerResponse>> {
    let channel = channel
        .parse::<ChannelName>()
        .map_err(|_| DashboardError::UnknownChannel(channel))?;
    let report = state.broadcaster.trigger_update(channel);
    Ok(Json(TriggerResponse {
        channel,
        delivered: report.delivered,
        failed: report.failed,
    }))
}

async fn post_refresh(State(state): State<AppState>) -> StatusCode {
    state.broadcaster.refresh_all();
    StatusCode::NO_CONTENT
}

async fn post_reconnect(State(state): State<AppState>) -> Json<SystemStatus> {
    state.broadcaster.reconnect();
    Json(state.broadcaster.system_status())
}

async fn get_metrics(State(state): State<AppState>) -> DashboardResult<Response> {
    if !state.metrics_enabled {
        return Err(DashboardError::MetricsDisabled);
    }
    let body = orbit_telemetry::gather_text()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// WebSocket upgrade handler.
async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let channels = match query.channels() {
        Ok(channels) => channels,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let Some(guard) = state.connection_limiter.try_acquire() else {
        warn!(
            current = state.connection_limiter.current_count(),
            max = state.config.max_connections,
            "WebSocket connection limit reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many connections").into_response();
    };

    info!(
        connections = state.connection_limiter.current_count(),
        channels = ?channels,
        "New WebSocket connection"
    );

    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, channels, guard))
}

/// Serialize a message for the wire. Failures are logged and yield `None`.
fn encode_message(message: &DashboardMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(error = %e, "Failed to serialize dashboard message");
            None
        }
    }
}

/// Handle a WebSocket session.
///
/// The session subscribes to its channels through the broadcaster and
/// unsubscribes when the client goes away.
async fn handle_ws_connection(
    socket: WebSocket,
    state: AppState,
    channels: Vec<ChannelName>,
    _guard: ConnectionGuard,
) {
    let (mut sender, mut receiver) = socket.split();

    let welcome = DashboardMessage::Welcome {
        timestamp_ms: chrono::Utc::now().timestamp_millis(),
        channels: channels.clone(),
        status: state.broadcaster.system_status(),
    };
    if let Some(json) = encode_message(&welcome) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            debug!("Failed to send welcome, client disconnected");
            return;
        }
    }

    let (tx, mut rx) = mpsc::channel::<String>(state.config.broadcast_capacity.max(1));
    let subscriptions: Vec<SubscriptionHandle> = channels
        .iter()
        .map(|&channel| {
            let tx = tx.clone();
            state.broadcaster.subscribe(channel, move |payload| {
                let json = serde_json::to_string(&DashboardMessage::emission(payload.clone()))
                    .map_err(|e| SubscriberError::new(format!("serialize: {e}")))?;
                tx.try_send(json)
                    .map_err(|e| SubscriberError::new(format!("session queue: {e}")))
            })
        })
        .collect();
    drop(tx);

    // Incoming frames only matter for close detection; axum answers pings.
    let mut incoming_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    debug!("Client sent close frame");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                if sender.send(Message::Text(msg.into())).await.is_err() {
                    debug!("Failed to send message, client disconnected");
                    break;
                }
            }
            _ = &mut incoming_task => {
                debug!("Incoming task completed, closing connection");
                break;
            }
        }
    }

    for subscription in &subscriptions {
        subscription.unsubscribe();
    }
    incoming_task.abort();

    info!(
        connections = state.connection_limiter.current_count().saturating_sub(1),
        "WebSocket connection closed"
    );
}

/// Serve the dashboard on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: CancellationToken,
) -> DashboardResult<()> {
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

/// Run the dashboard HTTP server.
pub async fn run_server(
    broadcaster: Broadcaster,
    config: DashboardConfig,
    metrics_enabled: bool,
    shutdown: CancellationToken,
) -> DashboardResult<()> {
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Starting dashboard server");

    let state = AppState::new(broadcaster, config).with_metrics(metrics_enabled);
    serve(listener, state, shutdown).await?;

    info!("Dashboard server stopped");
    Ok(())
}
