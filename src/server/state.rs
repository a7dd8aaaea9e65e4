use std::sync::Arc;

use crate::platform::PlatformClient;
use crate::reconcile::{ReconcilerConfig, ServiceReconciler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<ServiceReconciler>,
}

impl AppState {
    pub fn new(platform: Arc<dyn PlatformClient>, config: ReconcilerConfig) -> Self {
        Self {
            reconciler: Arc::new(ServiceReconciler::with_config(platform, config)),
        }
    }

    pub fn with_reconciler(reconciler: ServiceReconciler) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryPlatform;

    #[test]
    fn test_app_state_creation() {
        let config = ReconcilerConfig {
            default_network: "edge".to_string(),
            ..Default::default()
        };
        let state = AppState::new(Arc::new(MemoryPlatform::new()), config);

        assert_eq!(state.reconciler.config().default_network, "edge");
    }
}
