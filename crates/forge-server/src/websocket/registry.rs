//! Registry of connected WebSocket clients.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::RwLock;
use tracing::debug;

use super::connection::ClientConnection;

/// Tracks active client connections indexed by connection ID.
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, Arc<ClientConnection>>>,
    /// Cached count, readable without taking the lock.
    count: AtomicUsize,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            count: AtomicUsize::new(0),
        }
    }

    /// Add a connection. Replaces any existing entry with the same ID.
    pub async fn add(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        let _ = conns.insert(connection.id.clone(), connection);
        self.count.store(conns.len(), Ordering::Relaxed);
        metrics::gauge!("ws_connections").set(conns.len() as f64);
    }

    /// Remove a connection by ID. A no-op when the ID is not registered.
    pub async fn remove(&self, connection_id: &str) {
        let mut conns = self.connections.write().await;
        if let Some(conn) = conns.remove(connection_id) {
            debug!(
                conn_id = connection_id,
                dropped = conn.drop_count(),
                "connection removed"
            );
        }
        self.count.store(conns.len(), Ordering::Relaxed);
        metrics::gauge!("ws_connections").set(conns.len() as f64);
    }

    /// Look up a connection by ID.
    pub async fn get(&self, connection_id: &str) -> Option<Arc<ClientConnection>> {
        self.connections.read().await.get(connection_id).cloned()
    }

    /// Number of active connections.
    pub fn connection_count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
