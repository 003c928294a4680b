//! Entry point into the OS service manager

use async_trait::async_trait;

use super::control::ControlDispatcher;
use crate::error::BoxError;

/// Connects a [`ControlDispatcher`] to the OS service manager
///
/// `run` registers the service under `name`, drives the dispatcher with the
/// manager's control requests, and returns once the dispatcher has reached
/// its terminal state. It returns an error if registration fails, possibly
/// without ever running the dispatcher.
#[async_trait]
pub trait ServiceRegistrar: Send + Sync {
    /// Register and serve until the dispatcher returns
    async fn run(&self, name: &str, dispatcher: ControlDispatcher) -> Result<(), BoxError>;
}
