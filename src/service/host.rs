//! Platform-independent service host interface

use async_trait::async_trait;
use std::sync::Arc;

use crate::app::ApplicationLifecycle;
use crate::error::Result;
use crate::logging::JsonlWriter;

/// Runs a hosted application for the lifetime of the service
#[async_trait]
pub trait ServiceHost: Send {
    /// Run the service; blocks until it has fully stopped
    async fn run(&mut self) -> Result<()>;

    /// Select foreground (debug) mode; must be called before [`run`](Self::run)
    fn set_debug(&mut self, enabled: bool);

    /// Service name
    fn name(&self) -> &str;
}

/// Create the service host suited to the current platform
///
/// Windows gets a [`ManagedHost`](super::ManagedHost) speaking the Service
/// Control Manager protocol; other platforms get a
/// [`PassthroughHost`](super::PassthroughHost) that runs the application
/// directly.
pub fn new_host(
    app: Arc<dyn ApplicationLifecycle>,
    name: impl Into<String>,
    journal: Option<Arc<JsonlWriter>>,
) -> Box<dyn ServiceHost> {
    #[cfg(windows)]
    {
        let host = super::ManagedHost::new(app, name);
        match journal {
            Some(journal) => Box::new(host.with_journal(journal)),
            None => Box::new(host),
        }
    }

    #[cfg(not(windows))]
    {
        let host = super::PassthroughHost::new(app, name);
        match journal {
            Some(journal) => Box::new(host.with_journal(journal)),
            None => Box::new(host),
        }
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;
    use crate::app::{Component, ComponentApp};
    use std::time::Duration;

    #[test]
    fn test_new_host_uses_service_name() {
        let app = Arc::new(ComponentApp::new(
            vec![Component::new("a", Duration::ZERO, Duration::ZERO)],
            Duration::from_secs(1),
            Duration::from_secs(1),
        ));
        let mut host = new_host(app, "demo", None);
        host.set_debug(true);
        assert_eq!(host.name(), "demo");
    }
}
