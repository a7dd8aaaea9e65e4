//! Service reconciler
//!
//! Creates, lists and deletes services against the platform. Nothing is
//! cached between calls: every operation starts from a fresh listing, which
//! is what makes deletion by name safe against stale IDs.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{Service, ServiceState};
use crate::platform::types::{
    ContainerSpec, NetworkAttachment, ResourceLimits, ResourceRequirements, ServiceMode,
    TaskTemplate,
};
use crate::platform::{PlatformClient, ServiceSpec, TaskFilter};

use super::aggregate;
use super::error::{ReconcileError, RemoveFailure};
use super::network::NetworkProvisioner;

/// Network services attach to when they do not name one
pub const DEFAULT_NETWORK: &str = "swarmctl-net";

/// What to do when one removal in a delete batch fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeletePolicy {
    /// Stop at the first failure; earlier removals are kept
    #[default]
    AbortOnFirst,
    /// Try every removal and report all failures together
    BestEffort,
}

/// Reconciler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub default_network: String,

    /// Fail service creation when its network cannot be provisioned
    pub strict_networking: bool,

    pub delete_policy: DeletePolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            default_network: DEFAULT_NETWORK.to_string(),
            strict_networking: false,
            delete_policy: DeletePolicy::AbortOnFirst,
        }
    }
}

/// Outcome of a successful delete batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    /// Names of removed services, once per removed ID
    pub removed: Vec<String>,
    /// Requested names with no live service
    pub skipped: Vec<String>,
}

/// Build the platform spec for a service attached to `network`
pub fn build_service_spec(service: &Service, network: &str) -> ServiceSpec {
    let memory_bytes = service.memory_limit_bytes();
    let resources = (memory_bytes > 0).then(|| ResourceRequirements {
        limits: Some(ResourceLimits {
            memory_bytes: i64::try_from(memory_bytes).unwrap_or(i64::MAX),
        }),
    });

    ServiceSpec {
        name: service.name.clone(),
        mode: ServiceMode::replicated(service.effective_replicas()),
        task_template: TaskTemplate {
            container_spec: ContainerSpec {
                image: service.image.clone(),
            },
            networks: vec![NetworkAttachment {
                target: network.to_string(),
            }],
            resources,
        },
    }
}

fn validate(service: &Service) -> Result<(), ReconcileError> {
    if service.name.trim().is_empty() {
        return Err(ReconcileError::InvalidService(
            "'name' must not be empty".to_string(),
        ));
    }
    if service.image.trim().is_empty() {
        return Err(ReconcileError::InvalidService(format!(
            "service '{}' has no image",
            service.name
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct ServiceReconciler {
    platform: Arc<dyn PlatformClient>,
    networks: NetworkProvisioner,
    config: ReconcilerConfig,
}

impl ServiceReconciler {
    pub fn new(platform: Arc<dyn PlatformClient>) -> Self {
        Self::with_config(platform, ReconcilerConfig::default())
    }

    pub fn with_config(platform: Arc<dyn PlatformClient>, config: ReconcilerConfig) -> Self {
        Self {
            networks: NetworkProvisioner::new(platform.clone()),
            platform,
            config,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn networks(&self) -> &NetworkProvisioner {
        &self.networks
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Declare a replicated service, provisioning its network first
    ///
    /// Returns the platform-assigned service ID.
    pub async fn create(&self, service: &Service) -> Result<String, ReconcileError> {
        validate(service)?;

        let network = service.resolved_network(&self.config.default_network);

        if let Err(e) = self.networks.ensure(network).await {
            if self.config.strict_networking {
                return Err(e);
            }
            warn!(
                service = %service.name,
                network = %network,
                "Continuing without a provisioned network: {}", e
            );
        }

        let spec = build_service_spec(service, network);
        let created = self.platform.create_service(&spec).await.map_err(|e| {
            ReconcileError::from_platform(e, |source| ReconcileError::ServiceCreateFailed {
                service_name: service.name.clone(),
                source,
            })
        })?;

        if let Some(warning) = created.warning.as_deref().filter(|w| !w.is_empty()) {
            warn!(service = %service.name, "Platform warning on service create: {}", warning);
        }
        info!(
            service = %service.name,
            id = %created.id,
            replicas = service.effective_replicas(),
            network = %network,
            "Created service"
        );

        Ok(created.id)
    }

    // =========================================================================
    // List
    // =========================================================================

    /// Observed state of every replicated service, sorted by name
    pub async fn list_states(&self) -> Result<Vec<ServiceState>, ReconcileError> {
        let services = self
            .platform
            .list_services()
            .await
            .map_err(|e| ReconcileError::from_platform(e, ReconcileError::ServiceListFailed))?;

        if services.is_empty() {
            debug!("No services on the platform");
            return Ok(Vec::new());
        }

        let filter = TaskFilter::for_services(services.iter().map(|s| s.id.clone()));
        let (tasks, nodes) = futures::try_join!(
            async {
                self.platform
                    .list_tasks(&filter)
                    .await
                    .map_err(|e| ReconcileError::from_platform(e, ReconcileError::TaskListFailed))
            },
            async {
                self.platform
                    .list_nodes()
                    .await
                    .map_err(|e| ReconcileError::from_platform(e, ReconcileError::NodeListFailed))
            },
        )?;

        debug!(
            services = services.len(),
            tasks = tasks.len(),
            nodes = nodes.len(),
            "Aggregating service state"
        );

        let states = aggregate::compute(&services, &tasks, &nodes);
        Ok(aggregate::sorted_by_name(states))
    }

    /// Every replicated service as declared, sorted by name
    pub async fn list(&self) -> Result<Vec<Service>, ReconcileError> {
        let states = self.list_states().await?;
        Ok(states.into_iter().map(Service::from).collect())
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Remove every live service whose name matches one of `services`
    ///
    /// IDs on the input are ignored; names are resolved against a single fresh
    /// listing taken for this call. The batch is not transactional.
    pub async fn delete(&self, services: &[ServiceState]) -> Result<DeleteReport, ReconcileError> {
        let live = self
            .platform
            .list_services()
            .await
            .map_err(|e| ReconcileError::from_platform(e, ReconcileError::ServiceListFailed))?;

        let mut report = DeleteReport::default();
        let mut failures = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        for requested in services {
            // Only replicated services are listed, so only they can be deleted by name
            let matches: Vec<&str> = live
                .iter()
                .filter(|s| s.spec.declared_replicas().is_some())
                .filter(|s| s.spec.name == requested.name)
                .map(|s| s.id.as_str())
                .collect();

            if matches.is_empty() {
                debug!(service = %requested.name, "No live service with this name, skipping");
                report.skipped.push(requested.name.clone());
                continue;
            }

            for id in matches {
                if !seen.insert(id) {
                    continue;
                }

                info!(service = %requested.name, id = %id, "Removing service");
                match self.platform.remove_service(id).await {
                    Ok(()) => report.removed.push(requested.name.clone()),
                    Err(e) if e.is_not_found() => {
                        debug!(service = %requested.name, id = %id, "Service already gone");
                        report.skipped.push(requested.name.clone());
                    }
                    Err(e) => {
                        warn!(service = %requested.name, id = %id, "Failed to remove service: {}", e);
                        match self.config.delete_policy {
                            DeletePolicy::AbortOnFirst => {
                                return Err(ReconcileError::ServiceRemoveFailed {
                                    service_name: requested.name.clone(),
                                    source: e,
                                });
                            }
                            DeletePolicy::BestEffort => failures.push(RemoveFailure {
                                service_name: requested.name.clone(),
                                error: e,
                            }),
                        }
                    }
                }
            }
        }

        if !failures.is_empty() {
            return Err(ReconcileError::BatchRemoveFailed { failures });
        }

        Ok(report)
    }

    /// Delete by plain names
    pub async fn delete_names(&self, names: &[String]) -> Result<DeleteReport, ReconcileError> {
        let requested: Vec<ServiceState> = names.iter().map(ServiceState::named).collect();
        self.delete(&requested).await
    }
}
