//! # forge-server
//!
//! Axum HTTP + `WebSocket` relay server.
//!
//! - HTTP endpoints: health check
//! - `WebSocket` gateway: connection registry, heartbeat, message dispatch
//! - Request dispatch: routes inbound analysis events to the Gemini client
//!   and emits the sanitized result back on the originating connection
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod dispatch;
pub mod health;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use dispatch::Dispatcher;
pub use server::ForgeServer;
