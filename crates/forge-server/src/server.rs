//! `ForgeServer` — Axum HTTP + WebSocket relay server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use forge_core::request::RequestKind;

use crate::config::ServerConfig;
use crate::dispatch::{Dispatcher, InboundFrame};
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::connection::ClientConnection;
use crate::websocket::heartbeat::{HeartbeatResult, LivenessWindow, run_heartbeat};
use crate::websocket::registry::ConnectionRegistry;

/// Outbound channel depth per connection.
const SEND_BUFFER: usize = 256;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registry of connected clients.
    pub registry: Arc<ConnectionRegistry>,
    /// Request dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

/// The relay server.
pub struct ForgeServer {
    config: Arc<ServerConfig>,
    registry: Arc<ConnectionRegistry>,
    dispatcher: Arc<Dispatcher>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl ForgeServer {
    /// Create a new server.
    #[must_use]
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(ConnectionRegistry::new()),
            dispatcher: Arc::new(dispatcher),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            dispatcher: self.dispatcher.clone(),
            shutdown: self.shutdown.clone(),
            start_time: self.start_time,
            config: self.config.clone(),
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/ws", get(ws_handler))
            .layer(TraceLayer::new_for_http())
            // Browser clients connect cross-origin
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Returns the bound address (useful with port `0`) and the join
    /// handle of the serve task.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        let local_addr = listener.local_addr()?;
        let app = self.router();
        let token = self.shutdown.token();

        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "server error");
            }
        });

        info!(addr = %local_addr, "listening");
        Ok((local_addr, handle))
    }

    /// Get the connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.registry.connection_count();
    Json(health::health_check(state.start_time, connections))
}

/// GET /ws — upgrade to a WebSocket session.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    if state.registry.connection_count() >= state.config.max_connections {
        warn!(
            max = state.config.max_connections,
            "connection limit reached, rejecting upgrade"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached").into_response();
    }
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one WebSocket session: write task, heartbeat task, read loop.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = format!("conn_{}", uuid::Uuid::now_v7());
    let (tx, mut rx) = mpsc::channel::<Arc<String>>(SEND_BUFFER);
    let connection = Arc::new(ClientConnection::new(conn_id.clone(), tx));
    state.registry.add(connection.clone()).await;
    info!(conn_id = %conn_id, "client connected");

    let (mut sink, mut stream) = socket.split();
    let cancel = state.shutdown.token().child_token();
    let window = LivenessWindow::from_config(&state.config);

    // Write task: forwards queued messages and sends protocol pings.
    let write_cancel = cancel.clone();
    let write_task = tokio::spawn(async move {
        let mut ping = tokio::time::interval(window.interval);
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(text) => {
                        if sink.send(Message::Text(text.as_str().into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                _ = ping.tick() => {
                    if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
                () = write_cancel.cancelled() => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Heartbeat task: closes the session when pongs stop arriving.
    let hb_connection = connection.clone();
    let hb_cancel = cancel.clone();
    let hb_registry = state.registry.clone();
    let hb_id = conn_id.clone();
    let heartbeat_task = tokio::spawn(async move {
        let result = run_heartbeat(hb_connection, window, hb_cancel.clone()).await;
        if result == HeartbeatResult::TimedOut {
            warn!(conn_id = %hb_id, "heartbeat timed out, closing connection");
            hb_registry.remove(&hb_id).await;
            hb_cancel.cancel();
        }
    });

    // Read loop.
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            msg = stream.next() => {
                let Some(msg) = msg else { break };
                match msg {
                    Ok(Message::Text(text)) => handle_text(&state, &connection, text.as_str()),
                    Ok(Message::Pong(_) | Message::Ping(_)) => connection.mark_alive(),
                    Ok(Message::Close(_)) => {
                        debug!(conn_id = %conn_id, "client sent close");
                        break;
                    }
                    Ok(Message::Binary(_)) => {
                        debug!(conn_id = %conn_id, "ignoring binary frame");
                    }
                    Err(e) => {
                        debug!(conn_id = %conn_id, error = %e, "websocket read error");
                        break;
                    }
                }
            }
        }
    }

    cancel.cancel();
    state.registry.remove(&conn_id).await;
    let _ = write_task.await;
    heartbeat_task.abort();
    info!(conn_id = %conn_id, "client disconnected");
}

/// Handle one inbound text frame.
///
/// Unknown events and malformed frames are logged and ignored; valid
/// requests are dispatched on their own task so a slow provider call
/// does not block the read loop.
fn handle_text(state: &AppState, connection: &Arc<ClientConnection>, text: &str) {
    let frame: InboundFrame = match serde_json::from_str(text) {
        Ok(f) => f,
        Err(e) => {
            warn!(conn_id = %connection.id, error = %e, "malformed frame, ignoring");
            return;
        }
    };

    let Some(kind) = RequestKind::from_request_event(&frame.event) else {
        warn!(conn_id = %connection.id, event = %frame.event, "unknown event, ignoring");
        return;
    };

    let dispatcher = state.dispatcher.clone();
    let conn = connection.clone();
    let _ = tokio::spawn(async move {
        if let Err(e) = dispatcher.handle(kind, conn, frame.payload).await {
            // The client is never told about failures; it sees silence.
            warn!(error = %e, "request failed, no response sent");
            metrics::counter!("relay_failures").increment(1);
        }
    });
}
