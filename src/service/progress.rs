//! Progress gates shared by the main sequence and the background task

use super::gate::Gate;

/// The three gates that order one service run
///
/// - `started`: application start finished (successfully or not)
/// - `stop_requested`: something asked the service to stop
/// - `stopped`: application stop finished
#[derive(Debug, Clone, Default)]
pub struct ProgressGates {
    pub started: Gate,
    pub stop_requested: Gate,
    pub stopped: Gate,
}

impl ProgressGates {
    /// Create a fresh set of unfired gates
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire every gate so no waiter is left blocked
    ///
    /// Used on every failure path.
    pub fn release_all(&self) {
        self.started.fire();
        self.stop_requested.fire();
        self.stopped.fire();
    }
}
