//! User-facing service description and the observed service summary

use serde::{Deserialize, Serialize};

/// Bytes per megabyte of memory limit
pub const BYTES_PER_MB: u64 = 1024 * 1024;

fn is_zero(v: &u64) -> bool {
    *v == 0
}

/// A service as requested by a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Platform-assigned ID, only present on listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    pub image: String,

    /// Desired replica count; zero means one
    #[serde(default, skip_serializing_if = "is_zero")]
    pub replicas: u64,

    /// Memory limit in MB; zero means unlimited
    #[serde(default, skip_serializing_if = "is_zero")]
    pub memory_limit: u64,

    /// Overlay network to attach, the configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

impl Service {
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn with_replicas(mut self, replicas: u64) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn with_memory_limit(mut self, mb: u64) -> Self {
        self.memory_limit = mb;
        self
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn effective_replicas(&self) -> u64 {
        self.replicas.max(1)
    }

    pub fn memory_limit_bytes(&self) -> u64 {
        self.memory_limit.saturating_mul(BYTES_PER_MB)
    }

    /// The network this service attaches to
    pub fn resolved_network<'a>(&'a self, default_network: &'a str) -> &'a str {
        match self.network.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => default_network,
        }
    }
}

/// Declared and observed summary of one replicated service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceState {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub replicas_required: u64,
    /// Running tasks on nodes that are not down
    #[serde(default)]
    pub replicas_running: u64,
    /// Tasks whose desired state is not shutdown
    #[serde(default)]
    pub replicas_active: u64,
    #[serde(default)]
    pub memory_limit_bytes: u64,
}

impl ServiceState {
    /// A state carrying only a name, as used for deletion requests
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_converged(&self) -> bool {
        self.replicas_running == self.replicas_required
    }
}

// ============================================================================
// Service directory: mapping between the two shapes
// ============================================================================

impl From<ServiceState> for Service {
    /// Listings report declared capacity, not the running count
    fn from(state: ServiceState) -> Self {
        Service {
            id: Some(state.id),
            name: state.name,
            image: state.image,
            replicas: state.replicas_required,
            // Round up so a sub-MB limit is not reported as unlimited
            memory_limit: state.memory_limit_bytes.div_ceil(BYTES_PER_MB),
            network: None,
        }
    }
}

impl From<&Service> for ServiceState {
    fn from(service: &Service) -> Self {
        ServiceState {
            id: service.id.clone().unwrap_or_default(),
            name: service.name.clone(),
            image: service.image.clone(),
            replicas_required: service.effective_replicas(),
            replicas_running: 0,
            replicas_active: 0,
            memory_limit_bytes: service.memory_limit_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_deserialization_defaults() {
        let json = r#"{"name": "api", "image": "x:1"}"#;
        let service: Service = serde_json::from_str(json).unwrap();

        assert_eq!(service.replicas, 0);
        assert_eq!(service.effective_replicas(), 1);
        assert_eq!(service.memory_limit, 0);
        assert!(service.network.is_none());
    }

    #[test]
    fn test_service_serialization_skips_zero_fields() {
        let service = Service::new("api", "x:1");
        let json = serde_json::to_string(&service).unwrap();

        assert_eq!(json, r#"{"name":"api","image":"x:1"}"#);
    }

    #[test]
    fn test_memory_limit_camel_case() {
        let json = r#"{"name": "api", "image": "x:1", "memoryLimit": 256}"#;
        let service: Service = serde_json::from_str(json).unwrap();

        assert_eq!(service.memory_limit_bytes(), 256 * 1024 * 1024);
    }

    #[test]
    fn test_resolved_network() {
        let service = Service::new("api", "x:1");
        assert_eq!(service.resolved_network("default-net"), "default-net");

        let service = service.with_network("backend");
        assert_eq!(service.resolved_network("default-net"), "backend");

        let blank = Service::new("api", "x:1").with_network("  ");
        assert_eq!(blank.resolved_network("default-net"), "default-net");
    }

    #[test]
    fn test_state_to_service_reports_required_replicas() {
        let state = ServiceState {
            id: "s1".to_string(),
            name: "web".to_string(),
            image: "nginx".to_string(),
            replicas_required: 3,
            replicas_running: 1,
            replicas_active: 3,
            memory_limit_bytes: 512 * BYTES_PER_MB,
        };

        let service = Service::from(state);
        assert_eq!(service.id.as_deref(), Some("s1"));
        assert_eq!(service.replicas, 3);
        assert_eq!(service.memory_limit, 512);
    }

    #[test]
    fn test_sub_mb_limit_rounds_up() {
        let state = ServiceState {
            memory_limit_bytes: 524_288,
            ..ServiceState::named("tiny")
        };
        assert_eq!(Service::from(state).memory_limit, 1);

        let state = ServiceState {
            memory_limit_bytes: 256 * BYTES_PER_MB + 1,
            ..ServiceState::named("odd")
        };
        assert_eq!(Service::from(state).memory_limit, 257);

        assert_eq!(Service::from(ServiceState::named("free")).memory_limit, 0);
    }

    #[test]
    fn test_service_to_state() {
        let service = Service::new("web", "nginx").with_memory_limit(64);
        let state = ServiceState::from(&service);

        assert_eq!(state.replicas_required, 1);
        assert_eq!(state.replicas_running, 0);
        assert_eq!(state.memory_limit_bytes, 64 * BYTES_PER_MB);
        assert!(!state.is_converged());
    }
}
