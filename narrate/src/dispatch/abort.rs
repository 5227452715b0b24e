//! Cooperative stop signal shared between the CLI and the dispatcher.

use std::sync::Arc;
use tokio::sync::watch;

/// Cooperative stop signal for a dispatch run.
///
/// Aborting never interrupts a call that is already in flight; the
/// dispatcher checks the flag between calls and while waiting.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `abort` has been called (immediately if it already was).
    pub async fn aborted(&self) {
        let mut rx = self.tx.subscribe();
        if rx.wait_for(|aborted| *aborted).await.is_err() {
            // The sender lives as long as self, so this is unreachable in practice.
            std::future::pending::<()>().await;
        }
    }
}
