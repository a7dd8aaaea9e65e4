//! Idempotent overlay network provisioning

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::platform::{NetworkCreateRequest, PlatformClient, PlatformError};

use super::error::{NetworkStage, ReconcileError};

/// What `ensure` found or did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkOutcome {
    /// The network was already there (or another caller created it first)
    Existing { id: Option<String> },
    /// The network was created by this call
    Created { id: String },
}

impl NetworkOutcome {
    pub fn was_created(&self) -> bool {
        matches!(self, NetworkOutcome::Created { .. })
    }
}

#[derive(Clone)]
pub struct NetworkProvisioner {
    platform: Arc<dyn PlatformClient>,
}

impl NetworkProvisioner {
    pub fn new(platform: Arc<dyn PlatformClient>) -> Self {
        Self { platform }
    }

    /// Find the ID of the network with exactly this name
    pub async fn lookup(&self, name: &str) -> Result<Option<String>, PlatformError> {
        let networks = self.platform.list_networks().await?;
        Ok(networks.into_iter().find(|n| n.name == name).map(|n| n.id))
    }

    /// Make sure an attachable overlay network named `name` exists
    ///
    /// A create that loses a race against another creator (name conflict) is
    /// reported as `Existing`.
    pub async fn ensure(&self, name: &str) -> Result<NetworkOutcome, ReconcileError> {
        let lookup_failed = |source: PlatformError| {
            ReconcileError::from_platform(source, |source| {
                ReconcileError::NetworkProvisionFailed {
                    network: name.to_string(),
                    stage: NetworkStage::Lookup,
                    source,
                }
            })
        };

        if let Some(id) = self.lookup(name).await.map_err(lookup_failed)? {
            debug!(network = %name, id = %id, "Network already exists");
            return Ok(NetworkOutcome::Existing { id: Some(id) });
        }

        match self
            .platform
            .create_network(&NetworkCreateRequest::overlay(name))
            .await
        {
            Ok(created) => {
                if let Some(warning) = created.warning.as_deref().filter(|w| !w.is_empty()) {
                    warn!(network = %name, "Platform warning on network create: {}", warning);
                }
                info!(network = %name, id = %created.id, "Created overlay network");
                Ok(NetworkOutcome::Created { id: created.id })
            }
            Err(e) if e.is_conflict() => {
                debug!(network = %name, "Network created concurrently, treating as existing");
                let id = self.lookup(name).await.ok().flatten();
                Ok(NetworkOutcome::Existing { id })
            }
            Err(e) => Err(ReconcileError::from_platform(e, |source| {
                ReconcileError::NetworkProvisionFailed {
                    network: name.to_string(),
                    stage: NetworkStage::Create,
                    source,
                }
            })),
        }
    }

    /// Remove the network named `name`
    ///
    /// Returns `false` when there was nothing to remove.
    pub async fn remove(&self, name: &str) -> Result<bool, ReconcileError> {
        let remove_failed = |source: PlatformError| {
            ReconcileError::from_platform(source, |source| ReconcileError::NetworkRemoveFailed {
                network: name.to_string(),
                source,
            })
        };

        let Some(id) = self.lookup(name).await.map_err(remove_failed)? else {
            debug!(network = %name, "Network not found, nothing to remove");
            return Ok(false);
        };

        match self.platform.remove_network(&id).await {
            Ok(()) => {
                info!(network = %name, id = %id, "Removed network");
                Ok(true)
            }
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(remove_failed(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::memory::{op, MemoryPlatform};

    fn provisioner() -> (Arc<MemoryPlatform>, NetworkProvisioner) {
        let platform = Arc::new(MemoryPlatform::new());
        let provisioner = NetworkProvisioner::new(platform.clone());
        (platform, provisioner)
    }

    #[tokio::test]
    async fn test_ensure_creates_missing_network() {
        let (platform, provisioner) = provisioner();

        let outcome = provisioner.ensure("backend").await.unwrap();

        assert!(outcome.was_created());
        assert_eq!(platform.network_names(), vec!["backend"]);
    }

    #[tokio::test]
    async fn test_ensure_twice_creates_once() {
        let (platform, provisioner) = provisioner();

        let first = provisioner.ensure("backend").await.unwrap();
        let second = provisioner.ensure("backend").await.unwrap();

        assert!(first.was_created());
        assert!(matches!(second, NetworkOutcome::Existing { id: Some(_) }));
        assert_eq!(platform.calls(op::CREATE_NETWORK), 1);
    }

    #[tokio::test]
    async fn test_ensure_matches_exact_name_only() {
        let (platform, provisioner) = provisioner();
        platform.add_network("n1", "backend-old");

        let outcome = provisioner.ensure("backend").await.unwrap();

        assert!(outcome.was_created());
        assert_eq!(platform.network_names(), vec!["backend", "backend-old"]);
    }

    #[tokio::test]
    async fn test_name_conflict_on_create_is_success() {
        let (platform, provisioner) = provisioner();
        platform.fail(
            op::CREATE_NETWORK,
            PlatformError::Conflict("network with name backend already exists".to_string()),
        );

        let outcome = provisioner.ensure("backend").await.unwrap();

        assert_eq!(outcome, NetworkOutcome::Existing { id: None });
    }

    #[tokio::test]
    async fn test_lookup_failure_reports_lookup_stage() {
        let (platform, provisioner) = provisioner();
        platform.fail(
            op::LIST_NETWORKS,
            PlatformError::Api {
                status: 500,
                message: "boom".to_string(),
            },
        );

        let err = provisioner.ensure("backend").await.unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::NetworkProvisionFailed {
                stage: NetworkStage::Lookup,
                ..
            }
        ));
        assert_eq!(platform.calls(op::CREATE_NETWORK), 0);
    }

    #[tokio::test]
    async fn test_create_failure_reports_create_stage() {
        let (platform, provisioner) = provisioner();
        platform.fail(
            op::CREATE_NETWORK,
            PlatformError::Api {
                status: 500,
                message: "no address pool".to_string(),
            },
        );

        let err = provisioner.ensure("backend").await.unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::NetworkProvisionFailed {
                stage: NetworkStage::Create,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_platform_is_unavailable() {
        let (platform, provisioner) = provisioner();
        platform.fail(
            op::LIST_NETWORKS,
            PlatformError::Unavailable("connection refused".to_string()),
        );

        let err = provisioner.ensure("backend").await.unwrap_err();
        assert!(matches!(err, ReconcileError::PlatformUnavailable(_)));
    }

    #[tokio::test]
    async fn test_remove_existing_network() {
        let (platform, provisioner) = provisioner();
        platform.add_network("n1", "backend");

        assert!(provisioner.remove("backend").await.unwrap());
        assert!(platform.network_names().is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_network_is_noop() {
        let (platform, provisioner) = provisioner();

        assert!(!provisioner.remove("backend").await.unwrap());
        assert_eq!(platform.calls(op::REMOVE_NETWORK), 0);
    }

    #[tokio::test]
    async fn test_remove_failure_is_reported() {
        let (platform, provisioner) = provisioner();
        platform.add_network("n1", "backend");
        platform.fail(
            op::REMOVE_NETWORK,
            PlatformError::Api {
                status: 403,
                message: "network in use".to_string(),
            },
        );

        let err = provisioner.remove("backend").await.unwrap_err();
        assert!(matches!(err, ReconcileError::NetworkRemoveFailed { .. }));
    }
}
