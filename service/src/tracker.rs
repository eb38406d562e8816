//! Resolving the coordinator endpoint.

use std::sync::Arc;

use quarry_core::{Fault, FaultResult};

use crate::api::Coordinator;
use crate::coordinator::InMemoryCoordinator;

/// Locates the coordinator and opens a connection to it.
pub trait ServiceTracker: Send + Sync {
    /// Address of the coordinator, for diagnostics.
    fn endpoint(&self) -> String;

    fn connect(&self) -> FaultResult<Arc<dyn Coordinator>>;
}

/// Tracker for a coordinator living in this process.
#[derive(Clone)]
pub struct LocalServiceTracker {
    coordinator: Arc<InMemoryCoordinator>,
}

impl LocalServiceTracker {
    pub fn new(coordinator: Arc<InMemoryCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Tracker over a fresh coordinator with default settings.
    pub fn standalone() -> Self {
        Self::new(Arc::new(InMemoryCoordinator::new()))
    }

    pub fn coordinator(&self) -> &Arc<InMemoryCoordinator> {
        &self.coordinator
    }
}

impl ServiceTracker for LocalServiceTracker {
    fn endpoint(&self) -> String {
        format!("local://{}", self.coordinator.instance_id())
    }

    fn connect(&self) -> FaultResult<Arc<dyn Coordinator>> {
        let coordinator: Arc<dyn Coordinator> = self.coordinator.clone();
        Ok(coordinator)
    }
}

/// Tracker whose coordinator can never be reached.
#[derive(Debug, Clone)]
pub struct UnreachableServiceTracker {
    endpoint: String,
}

impl UnreachableServiceTracker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl ServiceTracker for UnreachableServiceTracker {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    fn connect(&self) -> FaultResult<Arc<dyn Coordinator>> {
        Err(Fault::connection_not_available(&self.endpoint))
    }
}
