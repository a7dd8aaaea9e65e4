//! Replica aggregation
//!
//! Pure functions that fold a snapshot of services, tasks and nodes into one
//! [`ServiceState`] per replicated service. No I/O happens here; the caller
//! fetches the snapshot.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::ServiceState;
use crate::platform::{NodeRecord, NodeState, ServiceRecord, TaskRecord, TaskState};

/// Per-service task counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicaTally {
    /// Running tasks placed on an active node
    pub running: u64,
    /// Tasks the scheduler still wants alive (desired state is not shutdown)
    pub active: u64,
}

/// IDs of nodes that are not down
pub fn active_nodes(nodes: &[NodeRecord]) -> HashSet<&str> {
    nodes
        .iter()
        .filter(|n| n.status.state != NodeState::Down)
        .map(|n| n.id.as_str())
        .collect()
}

/// Count running and active tasks per service ID
pub fn tally_tasks<'a>(
    tasks: &'a [TaskRecord],
    active_nodes: &HashSet<&str>,
) -> HashMap<&'a str, ReplicaTally> {
    let mut tallies: HashMap<&str, ReplicaTally> = HashMap::new();

    for task in tasks {
        let tally = tallies.entry(task.service_id.as_str()).or_default();
        if task.desired_state != TaskState::Shutdown {
            tally.active += 1;
        }
        if task.status.state == TaskState::Running && active_nodes.contains(task.node_id.as_str())
        {
            tally.running += 1;
        }
    }

    tallies
}

/// Build the state of every replicated service, keyed by service ID
///
/// Services without a declared replica count (global mode) are left out.
pub fn compute(
    services: &[ServiceRecord],
    tasks: &[TaskRecord],
    nodes: &[NodeRecord],
) -> HashMap<String, ServiceState> {
    let active = active_nodes(nodes);
    let tallies = tally_tasks(tasks, &active);

    services
        .iter()
        .filter_map(|service| {
            let required = service.spec.declared_replicas()?;
            let tally = tallies
                .get(service.id.as_str())
                .copied()
                .unwrap_or_default();

            Some((
                service.id.clone(),
                ServiceState {
                    id: service.id.clone(),
                    name: service.spec.name.clone(),
                    image: service.spec.image().to_string(),
                    replicas_required: required,
                    replicas_running: tally.running,
                    replicas_active: tally.active,
                    memory_limit_bytes: service.spec.memory_limit_bytes(),
                },
            ))
        })
        .collect()
}

/// Natural-order comparison of service names, `web2` before `web10`
pub fn compare_names(a: &str, b: &str) -> Ordering {
    natord::compare(a, b)
}

/// Flatten an aggregation into a list sorted by name, then ID
pub fn sorted_by_name(states: HashMap<String, ServiceState>) -> Vec<ServiceState> {
    let mut list: Vec<ServiceState> = states.into_values().collect();
    list.sort_by(|a, b| compare_names(&a.name, &b.name).then_with(|| a.id.cmp(&b.id)));
    list
}
