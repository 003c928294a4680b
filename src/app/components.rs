//! Demonstration application built from named components
//!
//! Each component takes a fixed time to start and to stop. Components start
//! in order and stop in reverse order; only components that finished starting
//! are stopped.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

use super::ApplicationLifecycle;
use crate::config::{ExpandedComponentConfig, ExpandedServiceConfig};
use crate::error::BoxError;

/// A single component of the demo application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Component name, used in logs
    pub name: String,
    /// Time spent starting
    pub start_delay: Duration,
    /// Time spent stopping
    pub stop_delay: Duration,
}

impl Component {
    /// Create a component with the given delays
    pub fn new(name: impl Into<String>, start_delay: Duration, stop_delay: Duration) -> Self {
        Self {
            name: name.into(),
            start_delay,
            stop_delay,
        }
    }
}

impl From<&ExpandedComponentConfig> for Component {
    fn from(config: &ExpandedComponentConfig) -> Self {
        Self::new(&config.name, config.start_delay, config.stop_delay)
    }
}

/// Application made of components started in sequence
#[derive(Debug)]
pub struct ComponentApp {
    components: Vec<Component>,
    start_timeout: Duration,
    stop_timeout: Duration,
    started: AtomicUsize,
}

impl ComponentApp {
    /// Create an application from components and lifecycle timeouts
    pub fn new(components: Vec<Component>, start_timeout: Duration, stop_timeout: Duration) -> Self {
        Self {
            components,
            start_timeout,
            stop_timeout,
            started: AtomicUsize::new(0),
        }
    }

    /// Build the application from resolved configuration
    pub fn from_config(
        service: &ExpandedServiceConfig,
        components: &[ExpandedComponentConfig],
    ) -> Self {
        Self::new(
            components.iter().map(Component::from).collect(),
            service.start_timeout,
            service.stop_timeout,
        )
    }

    /// Components of this application
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Number of components currently started
    pub fn started_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApplicationLifecycle for ComponentApp {
    async fn start(&self) -> Result<(), BoxError> {
        for component in &self.components[self.started_count()..] {
            info!(component = %component.name, "Component starting");
            tokio::time::sleep(component.start_delay).await;
            self.started.fetch_add(1, Ordering::SeqCst);
            info!(component = %component.name, "Component started");
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), BoxError> {
        while let Some(index) = self.started_count().checked_sub(1) {
            let component = &self.components[index];
            info!(component = %component.name, "Component stopping");
            tokio::time::sleep(component.stop_delay).await;
            self.started.store(index, Ordering::SeqCst);
            info!(component = %component.name, "Component stopped");
        }
        Ok(())
    }

    fn start_timeout(&self) -> Duration {
        self.start_timeout
    }

    fn stop_timeout(&self) -> Duration {
        self.stop_timeout
    }
}
