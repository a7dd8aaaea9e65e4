//! Orchestration platform access
//!
//! Everything the reconciler knows about the cluster comes through the
//! [`PlatformClient`] trait. [`DockerClient`] talks to a Docker Engine over
//! HTTP; [`MemoryPlatform`] keeps the whole cluster in process for tests and
//! local experiments.

pub mod docker;
pub mod memory;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use docker::DockerClient;
pub use memory::MemoryPlatform;
pub use types::{
    NetworkCreateRequest, NetworkCreated, NetworkSummary, NodeRecord, NodeState, ServiceCreated,
    ServiceRecord, ServiceSpec, TaskFilter, TaskRecord, TaskState,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The platform could not be reached or the client could not be built
    #[error("Platform unavailable: {0}")]
    Unavailable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl PlatformError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, PlatformError::Unavailable(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PlatformError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PlatformError::NotFound(_))
    }
}

// ============================================================================
// SBIO: Trait for abstraction (allows mocking in tests)
// ============================================================================

#[async_trait]
pub trait PlatformClient: Send + Sync {
    async fn list_networks(&self) -> Result<Vec<NetworkSummary>, PlatformError>;

    async fn create_network(
        &self,
        request: &NetworkCreateRequest,
    ) -> Result<NetworkCreated, PlatformError>;

    async fn remove_network(&self, id: &str) -> Result<(), PlatformError>;

    async fn list_services(&self) -> Result<Vec<ServiceRecord>, PlatformError>;

    async fn create_service(&self, spec: &ServiceSpec) -> Result<ServiceCreated, PlatformError>;

    async fn remove_service(&self, id: &str) -> Result<(), PlatformError>;

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>, PlatformError>;

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>, PlatformError>;
}
