//! Wire types for the orchestration platform
//!
//! Field names follow the Docker Engine API so the same structs serve the HTTP
//! adapter and the in-memory platform.

use serde::{Deserialize, Serialize};

// ============================================================================
// Networks
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSummary {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Driver", default)]
    pub driver: String,
}

/// Request body for network creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCreateRequest {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Driver")]
    pub driver: String,
    #[serde(rename = "Attachable")]
    pub attachable: bool,
    #[serde(rename = "CheckDuplicate")]
    pub check_duplicate: bool,
}

impl NetworkCreateRequest {
    /// An attachable overlay network spanning the swarm
    pub fn overlay(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: "overlay".to_string(),
            attachable: true,
            check_duplicate: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCreated {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Warning", default)]
    pub warning: Option<String>,
}

// ============================================================================
// Services
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Spec")]
    pub spec: ServiceSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Mode", default)]
    pub mode: ServiceMode,
    #[serde(rename = "TaskTemplate", default)]
    pub task_template: TaskTemplate,
}

impl ServiceSpec {
    /// Declared replica count, `None` for global or unspecified modes
    pub fn declared_replicas(&self) -> Option<u64> {
        self.mode.replicated.as_ref().and_then(|r| r.replicas)
    }

    pub fn image(&self) -> &str {
        &self.task_template.container_spec.image
    }

    pub fn memory_limit_bytes(&self) -> u64 {
        self.task_template
            .resources
            .as_ref()
            .and_then(|r| r.limits.as_ref())
            .map(|l| l.memory_bytes.max(0) as u64)
            .unwrap_or(0)
    }

    pub fn network_targets(&self) -> Vec<&str> {
        self.task_template
            .networks
            .iter()
            .map(|n| n.target.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMode {
    #[serde(rename = "Replicated", default, skip_serializing_if = "Option::is_none")]
    pub replicated: Option<ReplicatedMode>,
    #[serde(rename = "Global", default, skip_serializing_if = "Option::is_none")]
    pub global: Option<GlobalMode>,
}

impl ServiceMode {
    pub fn replicated(replicas: u64) -> Self {
        Self {
            replicated: Some(ReplicatedMode {
                replicas: Some(replicas),
            }),
            global: None,
        }
    }

    pub fn global() -> Self {
        Self {
            replicated: None,
            global: Some(GlobalMode {}),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicatedMode {
    #[serde(rename = "Replicas", default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalMode {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    #[serde(rename = "ContainerSpec", default)]
    pub container_spec: ContainerSpec,
    #[serde(rename = "Networks", default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<NetworkAttachment>,
    #[serde(rename = "Resources", default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    #[serde(rename = "Image", default)]
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAttachment {
    #[serde(rename = "Target")]
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(rename = "Limits", default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceLimits>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(rename = "MemoryBytes", default)]
    pub memory_bytes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCreated {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Warning", default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// ============================================================================
// Tasks
// ============================================================================

/// Swarm task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    New,
    Allocated,
    Pending,
    Assigned,
    Accepted,
    Preparing,
    Ready,
    Starting,
    Running,
    Complete,
    Shutdown,
    Failed,
    Rejected,
    Remove,
    Orphaned,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "ServiceID")]
    pub service_id: String,
    /// Empty until the scheduler assigns the task
    #[serde(rename = "NodeID", default)]
    pub node_id: String,
    #[serde(rename = "DesiredState", default)]
    pub desired_state: TaskState,
    #[serde(rename = "Status", default)]
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    #[serde(rename = "State", default)]
    pub state: TaskState,
}

/// Task listing filter; an empty filter lists every task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub service_ids: Vec<String>,
}

impl TaskFilter {
    pub fn for_services(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            service_ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, task: &TaskRecord) -> bool {
        self.service_ids.is_empty() || self.service_ids.iter().any(|id| *id == task.service_id)
    }
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Down,
    Ready,
    Disconnected,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Status", default)]
    pub status: NodeStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    #[serde(rename = "State", default)]
    pub state: NodeState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_record_deserialization() {
        let json = r#"{
            "ID": "s1",
            "Version": {"Index": 12},
            "Spec": {
                "Name": "web",
                "Mode": {"Replicated": {"Replicas": 3}},
                "TaskTemplate": {
                    "ContainerSpec": {"Image": "nginx:1.25"},
                    "Resources": {"Limits": {"MemoryBytes": 268435456}},
                    "Networks": [{"Target": "swarmctl-net"}]
                }
            }
        }"#;

        let record: ServiceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "s1");
        assert_eq!(record.spec.name, "web");
        assert_eq!(record.spec.declared_replicas(), Some(3));
        assert_eq!(record.spec.image(), "nginx:1.25");
        assert_eq!(record.spec.memory_limit_bytes(), 256 * 1024 * 1024);
        assert_eq!(record.spec.network_targets(), vec!["swarmctl-net"]);
    }

    #[test]
    fn test_global_service_has_no_declared_replicas() {
        let json = r#"{"ID": "g1", "Spec": {"Name": "agent", "Mode": {"Global": {}}}}"#;
        let record: ServiceRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.spec.declared_replicas(), None);
        assert_eq!(record.spec.memory_limit_bytes(), 0);
    }

    #[test]
    fn test_unknown_task_state_does_not_fail() {
        let json = r#"{
            "ID": "t1",
            "ServiceID": "s1",
            "NodeID": "n1",
            "DesiredState": "running",
            "Status": {"State": "hibernating"}
        }"#;

        let task: TaskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(task.desired_state, TaskState::Running);
        assert_eq!(task.status.state, TaskState::Unknown);
    }

    #[test]
    fn test_unrecognised_node_state_is_unknown() {
        let json = r#"[
            {"ID": "n1", "Status": {"State": "ready"}},
            {"ID": "n2", "Status": {"State": "draining"}}
        ]"#;

        let nodes: Vec<NodeRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(nodes[0].status.state, NodeState::Ready);
        assert_eq!(nodes[1].status.state, NodeState::Unknown);
    }

    #[test]
    fn test_spec_serialization_skips_empty_fields() {
        let spec = ServiceSpec {
            name: "api".to_string(),
            mode: ServiceMode::replicated(2),
            task_template: TaskTemplate {
                container_spec: ContainerSpec {
                    image: "x:1".to_string(),
                },
                networks: vec![],
                resources: None,
            },
        };

        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains(r#""Replicas":2"#));
        assert!(!json.contains("Global"));
        assert!(!json.contains("Networks"));
        assert!(!json.contains("Resources"));
    }

    #[test]
    fn test_task_filter_matches() {
        let task = TaskRecord {
            id: "t1".to_string(),
            service_id: "s1".to_string(),
            node_id: String::new(),
            desired_state: TaskState::Running,
            status: TaskStatus::default(),
        };

        assert!(TaskFilter::default().matches(&task));
        assert!(TaskFilter::for_services(["s1"]).matches(&task));
        assert!(!TaskFilter::for_services(["s2"]).matches(&task));
    }
}
