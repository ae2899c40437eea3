//! Shutdown signalling for the relay's long-lived tasks.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long draining tasks may take before shutdown stops waiting.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Fans one shutdown signal out to every server task.
///
/// Connection sessions derive child tokens from [`token`](Self::token),
/// so cancelling here closes every open WebSocket and stops the accept
/// loop. In-flight provider calls are not interrupted; their emits land
/// on closed channels and are counted as drops.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    drain_timeout: Duration,
}

impl ShutdownCoordinator {
    /// Create a coordinator with the default drain timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            drain_timeout: DRAIN_TIMEOUT,
        }
    }

    /// Override the drain timeout.
    #[must_use]
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// A token for a task that should stop on shutdown. Sessions derive
    /// child tokens from this so they can also be cancelled individually.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Signal shutdown without waiting for anything.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether shutdown has been signalled.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Signal shutdown and wait for the given tasks to drain.
    ///
    /// Tasks still running after the drain timeout are abandoned; they
    /// die with the process.
    pub async fn graceful_shutdown(&self, handles: Vec<JoinHandle<()>>) {
        self.shutdown();
        info!(tasks = handles.len(), "draining server tasks");

        let drained = futures::future::join_all(handles);
        if tokio::time::timeout(self.drain_timeout, drained).await.is_err() {
            warn!(
                timeout_secs = self.drain_timeout.as_secs(),
                "drain timed out, abandoning remaining tasks"
            );
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        assert!(!ShutdownCoordinator::new().is_shutting_down());
    }

    #[test]
    fn shutdown_reaches_every_derived_token() {
        let coord = ShutdownCoordinator::new();
        let session_a = coord.token().child_token();
        let session_b = coord.token().child_token();

        coord.shutdown();

        assert!(coord.is_shutting_down());
        assert!(session_a.is_cancelled());
        assert!(session_b.is_cancelled());
    }

    #[test]
    fn child_cancel_does_not_shut_the_server_down() {
        let coord = ShutdownCoordinator::new();
        let session = coord.token().child_token();

        // One session dying (heartbeat timeout) leaves the server up
        session.cancel();
        assert!(!coord.is_shutting_down());
    }

    #[test]
    fn repeated_shutdown_is_harmless() {
        let coord = ShutdownCoordinator::new();
        coord.shutdown();
        coord.shutdown();
        assert!(coord.is_shutting_down());
    }

    #[tokio::test]
    async fn graceful_shutdown_waits_for_cooperative_tasks() {
        let coord = ShutdownCoordinator::new();
        let token = coord.token();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            token.cancelled().await;
            let _ = tx.send(());
        });

        coord.graceful_shutdown(vec![task]).await;

        // The task observed the signal and finished before we returned
        assert!(rx.await.is_ok());
        assert!(coord.is_shutting_down());
    }

    #[tokio::test]
    async fn graceful_shutdown_abandons_stuck_tasks() {
        let coord = ShutdownCoordinator::new().with_drain_timeout(Duration::from_millis(50));

        // Ignores cancellation entirely
        let stuck = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(300)).await;
        });

        coord.graceful_shutdown(vec![stuck]).await;
        assert!(coord.is_shutting_down());
    }

    #[tokio::test]
    async fn graceful_shutdown_with_no_tasks_returns_immediately() {
        let coord = ShutdownCoordinator::new();
        coord.graceful_shutdown(Vec::new()).await;
        assert!(coord.is_shutting_down());
    }
}
