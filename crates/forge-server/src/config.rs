//! Relay server configuration.

use serde::{Deserialize, Serialize};

/// Tunables for the relay's listener and per-connection behavior.
///
/// Every field has a default, so a partial JSON document overriding a
/// single knob deserializes cleanly.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port to bind; `0` lets the OS pick (tests rely on this).
    pub port: u16,
    /// Upgrade requests beyond this many open connections are rejected
    /// with `503` before the WebSocket handshake completes.
    pub max_connections: usize,
    /// Ping cadence for connection liveness, in seconds.
    pub heartbeat_interval_secs: u64,
    /// Client silence tolerated before the connection is dropped,
    /// in seconds.
    pub heartbeat_timeout_secs: u64,
    /// Largest accepted WebSocket message, in bytes. Bounds the size of
    /// the code files clients submit for analysis.
    pub max_message_size: usize,
}

impl ServerConfig {
    /// The `host:port` string handed to the TCP listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 50,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            max_message_size: 16 * 1024 * 1024, // 16 MB
        }
    }
}
