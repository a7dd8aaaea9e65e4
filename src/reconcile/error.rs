use std::fmt;

use thiserror::Error;

use crate::platform::PlatformError;

/// Where network provisioning failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStage {
    /// Checking whether the network already exists
    Lookup,
    /// Creating the missing network
    Create,
}

impl fmt::Display for NetworkStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkStage::Lookup => write!(f, "lookup"),
            NetworkStage::Create => write!(f, "create"),
        }
    }
}

/// One failed removal inside a best-effort batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveFailure {
    pub service_name: String,
    pub error: PlatformError,
}

/// Errors that can occur while reconciling services and networks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Platform unavailable: {0}")]
    PlatformUnavailable(String),

    #[error("Invalid service: {0}")]
    InvalidService(String),

    #[error("Network '{network}' provisioning failed during {stage}: {source}")]
    NetworkProvisionFailed {
        network: String,
        stage: NetworkStage,
        source: PlatformError,
    },

    #[error("Failed to remove network '{network}': {source}")]
    NetworkRemoveFailed {
        network: String,
        source: PlatformError,
    },

    #[error("Failed to create service '{service_name}': {source}")]
    ServiceCreateFailed {
        service_name: String,
        source: PlatformError,
    },

    #[error("Failed to list services: {0}")]
    ServiceListFailed(PlatformError),

    #[error("Failed to list tasks: {0}")]
    TaskListFailed(PlatformError),

    #[error("Failed to list nodes: {0}")]
    NodeListFailed(PlatformError),

    #[error("Failed to remove service '{service_name}': {source}")]
    ServiceRemoveFailed {
        service_name: String,
        source: PlatformError,
    },

    #[error("Failed to remove {} service(s): {}", .failures.len(), failed_names(.failures))]
    BatchRemoveFailed { failures: Vec<RemoveFailure> },
}

fn failed_names(failures: &[RemoveFailure]) -> String {
    failures
        .iter()
        .map(|f| f.service_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ReconcileError {
    /// Wrap a platform error, surfacing transport failures as `PlatformUnavailable`
    pub(crate) fn from_platform(
        err: PlatformError,
        wrap: impl FnOnce(PlatformError) -> ReconcileError,
    ) -> ReconcileError {
        match err {
            PlatformError::Unavailable(msg) => ReconcileError::PlatformUnavailable(msg),
            other => wrap(other),
        }
    }

    /// Whether retrying later could succeed without changing the request
    pub fn is_transient(&self) -> bool {
        match self {
            ReconcileError::PlatformUnavailable(_) => true,
            ReconcileError::InvalidService(_) => false,
            ReconcileError::NetworkProvisionFailed { source, .. }
            | ReconcileError::NetworkRemoveFailed { source, .. }
            | ReconcileError::ServiceCreateFailed { source, .. }
            | ReconcileError::ServiceRemoveFailed { source, .. } => !source.is_conflict(),
            ReconcileError::ServiceListFailed(_)
            | ReconcileError::TaskListFailed(_)
            | ReconcileError::NodeListFailed(_) => true,
            ReconcileError::BatchRemoveFailed { .. } => true,
        }
    }
}
