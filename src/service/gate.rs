//! One-shot signal shared between the lifecycle tasks
//!
//! A [`Gate`] starts closed and opens exactly once. Any number of tasks can
//! wait on it, before or after it opens, and any number of tasks can fire it.

use std::sync::Arc;
use tokio::sync::watch;

/// One-shot, idempotent, multi-waiter signal
///
/// Cloning a gate yields another handle to the same signal.
#[derive(Debug, Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    /// Create a new unfired gate
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the gate, waking every waiter
    ///
    /// Returns `true` only for the call that actually opened the gate;
    /// every later call is a no-op and returns `false`.
    pub fn fire(&self) -> bool {
        self.tx.send_if_modified(|fired| {
            if *fired {
                false
            } else {
                *fired = true;
                true
            }
        })
    }

    /// Whether the gate has been fired
    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the gate is fired
    ///
    /// Returns immediately if it already has been.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this cannot observe a closed channel.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}
