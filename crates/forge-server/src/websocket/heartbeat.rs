//! Client liveness monitoring over WebSocket ping/pong.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use super::connection::ClientConnection;
use crate::config::ServerConfig;

/// Ping cadence and silence tolerance for one connection.
#[derive(Clone, Copy, Debug)]
pub struct LivenessWindow {
    /// Time between liveness checks. The connection's write task sends a
    /// protocol ping on the same cadence.
    pub interval: Duration,
    /// Total silence tolerated before the client is declared dead.
    pub timeout: Duration,
}

impl LivenessWindow {
    /// Derive the window from server configuration.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.heartbeat_interval_secs),
            timeout: Duration::from_secs(config.heartbeat_timeout_secs),
        }
    }

    /// How many consecutive silent checks fit in the timeout.
    ///
    /// Computed at millisecond granularity and clamped to at least one,
    /// so a timeout shorter than the interval still tolerates one miss.
    #[must_use]
    pub fn allowed_misses(&self) -> u32 {
        let interval_ms = self.interval.as_millis().max(1);
        let misses = self.timeout.as_millis() / interval_ms;
        u32::try_from(misses).unwrap_or(u32::MAX).max(1)
    }
}

/// Outcome of the liveness loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// The client went silent for the whole window.
    TimedOut,
    /// The session ended for another reason before the client went silent.
    Cancelled,
}

/// Watch a connection until it goes silent or the session is cancelled.
///
/// Every `window.interval` the pong flag is checked and cleared. A silent
/// check counts as a miss; any pong resets the count. Once misses reach
/// [`LivenessWindow::allowed_misses`] the connection is declared dead and
/// the caller is expected to tear the session down.
pub async fn run_heartbeat(
    connection: Arc<ClientConnection>,
    window: LivenessWindow,
    cancel: CancellationToken,
) -> HeartbeatResult {
    let allowed = window.allowed_misses();
    let mut ticks = time::interval(window.interval);
    let mut misses: u32 = 0;

    loop {
        tokio::select! {
            _ = ticks.tick() => {
                // check_alive clears the flag; the next pong re-sets it
                if connection.check_alive() {
                    misses = 0;
                } else {
                    misses += 1;
                    if misses >= allowed {
                        return HeartbeatResult::TimedOut;
                    }
                }
            }
            () = cancel.cancelled() => return HeartbeatResult::Cancelled,
        }
    }
}
