//! In-process platform
//!
//! Holds networks, services, tasks and nodes in memory and behaves like a
//! swarm manager for the calls the reconciler makes: duplicate names conflict,
//! removing unknown IDs is `NotFound`. There is no scheduler, so tasks only
//! exist when added explicitly.
//!
//! Every call is counted and any call can be made to fail, which is how the
//! reconciler's error policies are exercised.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use super::types::{
    NetworkCreateRequest, NetworkCreated, NetworkSummary, NodeRecord, NodeState, NodeStatus,
    ServiceCreated, ServiceRecord, ServiceSpec, TaskFilter, TaskRecord, TaskState, TaskStatus,
};
use super::{PlatformClient, PlatformError};

/// Names of the platform operations, used for call counting and fault injection
pub mod op {
    pub const LIST_NETWORKS: &str = "list_networks";
    pub const CREATE_NETWORK: &str = "create_network";
    pub const REMOVE_NETWORK: &str = "remove_network";
    pub const LIST_SERVICES: &str = "list_services";
    pub const CREATE_SERVICE: &str = "create_service";
    pub const REMOVE_SERVICE: &str = "remove_service";
    pub const LIST_TASKS: &str = "list_tasks";
    pub const LIST_NODES: &str = "list_nodes";
}

#[derive(Default)]
pub struct MemoryPlatform {
    networks: DashMap<String, NetworkSummary>,
    services: DashMap<String, ServiceRecord>,
    tasks: DashMap<String, TaskRecord>,
    nodes: DashMap<String, NodeRecord>,
    next_id: AtomicU64,
    calls: DashMap<&'static str, usize>,
    failures: DashMap<&'static str, PlatformError>,
    removal_failures: DashMap<String, PlatformError>,
    last_task_filter: Mutex<Option<TaskFilter>>,
}

impl MemoryPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}{}", prefix, n)
    }

    /// Count the call and return the injected failure, if any
    fn enter(&self, name: &'static str) -> Result<(), PlatformError> {
        *self.calls.entry(name).or_insert(0) += 1;
        match self.failures.get(name) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    pub fn add_network(&self, id: &str, name: &str) {
        self.networks.insert(
            id.to_string(),
            NetworkSummary {
                id: id.to_string(),
                name: name.to_string(),
                driver: "overlay".to_string(),
            },
        );
    }

    pub fn add_service(&self, id: &str, spec: ServiceSpec) {
        self.services.insert(
            id.to_string(),
            ServiceRecord {
                id: id.to_string(),
                spec,
            },
        );
    }

    pub fn add_node(&self, id: &str, state: NodeState) {
        self.nodes.insert(
            id.to_string(),
            NodeRecord {
                id: id.to_string(),
                status: NodeStatus { state },
            },
        );
    }

    /// Add a task and return its generated ID
    pub fn add_task(
        &self,
        service_id: &str,
        node_id: &str,
        desired: TaskState,
        current: TaskState,
    ) -> String {
        let id = self.next_id("task-");
        self.tasks.insert(
            id.clone(),
            TaskRecord {
                id: id.clone(),
                service_id: service_id.to_string(),
                node_id: node_id.to_string(),
                desired_state: desired,
                status: TaskStatus { state: current },
            },
        );
        id
    }

    pub fn set_node_state(&self, id: &str, state: NodeState) {
        if let Some(mut node) = self.nodes.get_mut(id) {
            node.status.state = state;
        }
    }

    // =========================================================================
    // Fault injection and inspection
    // =========================================================================

    /// Make every subsequent call to `op` fail with `err`
    pub fn fail(&self, op: &'static str, err: PlatformError) {
        self.failures.insert(op, err);
    }

    pub fn clear_failure(&self, op: &'static str) {
        self.failures.remove(op);
    }

    /// Make removal of one specific service fail
    pub fn fail_service_removal(&self, service_id: &str, err: PlatformError) {
        self.removal_failures.insert(service_id.to_string(), err);
    }

    pub fn calls(&self, op: &str) -> usize {
        self.calls.get(op).map(|c| *c).unwrap_or(0)
    }

    pub fn last_task_filter(&self) -> Option<TaskFilter> {
        self.last_task_filter
            .lock()
            .ok()
            .and_then(|f| f.clone())
    }

    pub fn service_by_name(&self, name: &str) -> Option<ServiceRecord> {
        self.services
            .iter()
            .find(|r| r.spec.name == name)
            .map(|r| r.clone())
    }

    pub fn network_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.networks.iter().map(|r| r.name.clone()).collect();
        names.sort();
        names
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}

#[async_trait]
impl PlatformClient for MemoryPlatform {
    async fn list_networks(&self) -> Result<Vec<NetworkSummary>, PlatformError> {
        self.enter(op::LIST_NETWORKS)?;
        Ok(self.networks.iter().map(|r| r.clone()).collect())
    }

    async fn create_network(
        &self,
        request: &NetworkCreateRequest,
    ) -> Result<NetworkCreated, PlatformError> {
        self.enter(op::CREATE_NETWORK)?;

        if request.check_duplicate && self.networks.iter().any(|r| r.name == request.name) {
            return Err(PlatformError::Conflict(format!(
                "network with name {} already exists",
                request.name
            )));
        }

        let id = self.next_id("net-");
        self.networks.insert(
            id.clone(),
            NetworkSummary {
                id: id.clone(),
                name: request.name.clone(),
                driver: request.driver.clone(),
            },
        );

        Ok(NetworkCreated { id, warning: None })
    }

    async fn remove_network(&self, id: &str) -> Result<(), PlatformError> {
        self.enter(op::REMOVE_NETWORK)?;
        self.networks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| PlatformError::NotFound(format!("network {} not found", id)))
    }

    async fn list_services(&self) -> Result<Vec<ServiceRecord>, PlatformError> {
        self.enter(op::LIST_SERVICES)?;
        Ok(self.services.iter().map(|r| r.clone()).collect())
    }

    async fn create_service(&self, spec: &ServiceSpec) -> Result<ServiceCreated, PlatformError> {
        self.enter(op::CREATE_SERVICE)?;

        if self.services.iter().any(|r| r.spec.name == spec.name) {
            return Err(PlatformError::Conflict(format!(
                "service {} already exists",
                spec.name
            )));
        }

        let id = self.next_id("svc-");
        self.add_service(&id, spec.clone());

        Ok(ServiceCreated { id, warning: None })
    }

    async fn remove_service(&self, id: &str) -> Result<(), PlatformError> {
        self.enter(op::REMOVE_SERVICE)?;

        if let Some(err) = self.removal_failures.get(id) {
            return Err(err.clone());
        }

        self.services
            .remove(id)
            .ok_or_else(|| PlatformError::NotFound(format!("service {} not found", id)))?;
        self.tasks.retain(|_, t| t.service_id != id);
        Ok(())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<TaskRecord>, PlatformError> {
        self.enter(op::LIST_TASKS)?;
        if let Ok(mut last) = self.last_task_filter.lock() {
            *last = Some(filter.clone());
        }
        Ok(self
            .tasks
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.clone())
            .collect())
    }

    async fn list_nodes(&self) -> Result<Vec<NodeRecord>, PlatformError> {
        self.enter(op::LIST_NODES)?;
        Ok(self.nodes.iter().map(|r| r.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::types::ServiceMode;

    fn spec(name: &str) -> ServiceSpec {
        ServiceSpec {
            name: name.to_string(),
            mode: ServiceMode::replicated(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_network_conflicts() {
        let platform = MemoryPlatform::new();
        let request = NetworkCreateRequest::overlay("backend");

        platform.create_network(&request).await.unwrap();
        let result = platform.create_network(&request).await;

        assert!(matches!(result, Err(PlatformError::Conflict(_))));
        assert_eq!(platform.calls(op::CREATE_NETWORK), 2);
        assert_eq!(platform.network_names(), vec!["backend"]);
    }

    #[tokio::test]
    async fn test_remove_unknown_service_is_not_found() {
        let platform = MemoryPlatform::new();
        let result = platform.remove_service("nope").await;
        assert!(matches!(result, Err(PlatformError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_service_drops_its_tasks() {
        let platform = MemoryPlatform::new();
        platform.add_service("s1", spec("web"));
        platform.add_task("s1", "n1", TaskState::Running, TaskState::Running);

        platform.remove_service("s1").await.unwrap();

        let tasks = platform.list_tasks(&TaskFilter::default()).await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let platform = MemoryPlatform::new();
        platform.fail(op::LIST_NODES, PlatformError::Unavailable("down".to_string()));

        assert!(platform.list_nodes().await.is_err());

        platform.clear_failure(op::LIST_NODES);
        assert!(platform.list_nodes().await.is_ok());
        assert_eq!(platform.calls(op::LIST_NODES), 2);
    }

    #[tokio::test]
    async fn test_task_filter_is_recorded() {
        let platform = MemoryPlatform::new();
        platform.add_task("s1", "n1", TaskState::Running, TaskState::Running);
        platform.add_task("s2", "n1", TaskState::Running, TaskState::Running);

        let tasks = platform
            .list_tasks(&TaskFilter::for_services(["s2"]))
            .await
            .unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].service_id, "s2");
        assert_eq!(
            platform.last_task_filter().unwrap().service_ids,
            vec!["s2".to_string()]
        );
    }
}
