//! # Service reconciliation
//!
//! Turns user intent ([`Service`](crate::model::Service)) into platform
//! resources and folds the platform's live state back into
//! [`ServiceState`](crate::model::ServiceState) summaries.
//!
//! ```text
//! create ──► NetworkProvisioner::ensure ──► PlatformClient::create_service
//! list   ──► services + tasks + nodes ──► aggregate::compute ──► sort by name
//! delete ──► fresh service listing ──► match names ──► remove_service × N
//! ```
//!
//! No state is kept between calls. Concurrent creates for the same name are
//! not serialized here; the platform's own name uniqueness decides.

pub mod aggregate;
pub mod error;
pub mod network;
pub mod service;

pub use aggregate::{compute, sorted_by_name, ReplicaTally};
pub use error::{NetworkStage, ReconcileError, RemoveFailure};
pub use network::{NetworkOutcome, NetworkProvisioner};
pub use service::{
    build_service_spec, DeletePolicy, DeleteReport, ReconcilerConfig, ServiceReconciler,
    DEFAULT_NETWORK,
};
