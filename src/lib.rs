//! swarmctl: declare and reconcile replicated services on Docker Swarm
//!
//! Layers, from the bottom up:
//! - [`platform`] - the engine API seam (`PlatformClient`) with a Docker
//!   implementation and an in-memory one for tests
//! - [`model`] - the public `Service` / `ServiceState` records
//! - [`reconcile`] - network provisioning, replica aggregation, create/list/delete
//! - [`config`], [`cli`], [`server`] - the outer surfaces

pub mod cli;
pub mod config;
pub mod model;
pub mod platform;
pub mod reconcile;
pub mod server;
