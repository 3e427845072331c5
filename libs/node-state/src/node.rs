//! Per-node container bookkeeping.
//!
//! [`NodeState`] is the scheduler's model of one worker node. It is responsible for:
//! - Deducting capacity as soon as the placement algorithm allocates containers
//! - Promoting allocated containers to active once a heartbeat reports them
//! - Returning capacity when the node reports a container complete
//! - Queueing containers the node must kill, and applications it must purge
//!
//! # Concurrency
//!
//! Every operation, reads included, runs under one mutex owned by the node.
//! Different nodes never share a lock. No operation acquires another node's
//! lock, so there is no lock ordering to get wrong.
//!
//! Heartbeats for one node must be reconciled in arrival order. That ordering
//! is the transport layer's job.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tally_id::{ApplicationId, ContainerId, NodeId};
use tracing::{debug, error, info, instrument, warn};

use crate::config::NodeStateConfig;
use crate::container::{Container, ContainerState};
use crate::error::{NodeStateError, NodeStateResult};
use crate::ledger::Ledger;
use crate::resource::Resource;
use crate::response::{flatten_report, HeartbeatReport, NodeResponse};

/// Read-only view of a node, as consumed by placement and monitoring.
pub trait NodeInfo {
    fn node_id(&self) -> NodeId;

    fn hostname(&self) -> &str;

    /// Network location (rack) of the node.
    fn rack_name(&self) -> &str;

    fn total_capability(&self) -> Resource;

    fn available_resource(&self) -> Resource;

    fn used_resource(&self) -> Resource;

    fn num_containers(&self) -> usize;
}

/// Mutable part of a node, guarded by the node's lock.
#[derive(Debug)]
struct Tracked {
    ledger: Ledger,
    /// Assigned by the scheduler, not yet confirmed by the node.
    allocated: BTreeMap<ContainerId, Container>,
    /// Confirmed running by the node.
    active: BTreeMap<ContainerId, Container>,
    /// Released containers the node has not been told to kill yet.
    to_clean: BTreeMap<ContainerId, Container>,
    finished_applications: Vec<ApplicationId>,
    num_containers: usize,
    last_reconciled_at: Option<DateTime<Utc>>,
}

impl Tracked {
    fn is_tracked(&self, id: &ContainerId) -> bool {
        self.allocated.contains_key(id) || self.active.contains_key(id)
    }

    /// Returns a container's resource to the ledger and stops counting it.
    fn retire(&mut self, container: &Container, hostname: &str) {
        // Missing resources were never deducted, and the ledger has logged it.
        let _ = self.ledger.add_resource(container.resource, hostname);
        self.num_containers = self.num_containers.saturating_sub(1);
    }
}

/// Bookkeeping for one cluster node.
#[derive(Debug)]
pub struct NodeState {
    node_id: NodeId,
    hostname: String,
    network_location: String,
    config: NodeStateConfig,
    tracked: Mutex<Tracked>,
}

impl NodeState {
    /// Create the state for a newly registered node with default configuration.
    pub fn new(
        node_id: NodeId,
        hostname: impl Into<String>,
        network_location: impl Into<String>,
        total_capability: Resource,
    ) -> Self {
        Self::with_config(
            node_id,
            hostname,
            network_location,
            total_capability,
            NodeStateConfig::default(),
        )
    }

    pub fn with_config(
        node_id: NodeId,
        hostname: impl Into<String>,
        network_location: impl Into<String>,
        total_capability: Resource,
        config: NodeStateConfig,
    ) -> Self {
        let hostname = hostname.into();
        let network_location = network_location.into();

        info!(
            node_id = %node_id,
            hostname = %hostname,
            rack = %network_location,
            capability = %total_capability,
            ledger_policy = %config.ledger_policy,
            "Tracking node"
        );

        Self {
            node_id,
            hostname,
            network_location,
            tracked: Mutex::new(Tracked {
                ledger: Ledger::new(total_capability, config.ledger_policy),
                allocated: BTreeMap::new(),
                active: BTreeMap::new(),
                to_clean: BTreeMap::new(),
                finished_applications: Vec::new(),
                num_containers: 0,
                last_reconciled_at: None,
            }),
            config,
        }
    }

    /// Record containers the scheduler has placed on this node.
    ///
    /// Capacity is deducted immediately, before the node acknowledges the
    /// work. Returns the number of containers that started being tracked.
    ///
    /// Under a permissive ledger the node may be over-committed; under a
    /// strict ledger a batch that does not fit is rejected as a whole.
    #[instrument(skip_all, fields(node_id = %self.node_id, application_id = %application_id))]
    pub fn allocate(
        &self,
        application_id: ApplicationId,
        containers: &[Container],
    ) -> NodeStateResult<usize> {
        if containers.is_empty() {
            error!(hostname = %self.hostname, "Adding empty container list");
            return Err(NodeStateError::NoContainers { application_id });
        }

        let mut tracked = self.tracked.lock();

        // Repeats of one id are skipped below, so they must not count twice here.
        let mut new_containers = BTreeMap::new();
        for c in containers.iter().filter(|c| !tracked.is_tracked(&c.id)) {
            new_containers.entry(c.id).or_insert(c.resource);
        }
        let requested: Resource = new_containers.values().flatten().copied().sum();
        if let Err(e) = tracked.ledger.check_deduction(requested, &self.hostname) {
            error!(
                hostname = %self.hostname,
                requested = %requested,
                available = %tracked.ledger.available(),
                "Rejected allocation beyond available resource"
            );
            return Err(e);
        }

        let mut accepted = 0;
        for container in containers {
            if tracked.is_tracked(&container.id) {
                warn!(container_id = %container.id, "Container already tracked, skipping");
                continue;
            }

            if let Err(e) = tracked.ledger.deduct_resource(container.resource, &self.hostname) {
                warn!(
                    container_id = %container.id,
                    error = %e,
                    "Tracking container without ledger change"
                );
            }
            if tracked.to_clean.remove(&container.id).is_some() {
                debug!(
                    container_id = %container.id,
                    "Re-allocated container withdrawn from cleanup queue"
                );
            }
            tracked.num_containers += 1;
            tracked
                .allocated
                .insert(container.id, container.with_state(ContainerState::Allocated));
            accepted += 1;

            info!(
                container_id = %container.id,
                hostname = %self.hostname,
                num_containers = tracked.num_containers,
                used = %tracked.ledger.used(),
                available = %tracked.ledger.available(),
                "Allocated container"
            );
        }

        info!(
            hostname = %self.hostname,
            containers = containers.len(),
            accepted,
            available = %tracked.ledger.available(),
            used = %tracked.ledger.used(),
            "Added containers"
        );

        Ok(accepted)
    }

    /// Merge a heartbeat into the tracked state.
    ///
    /// `None` means the heartbeat carried no container report; nothing is
    /// mutated and nothing is drained.
    pub fn status_update(&self, report: Option<&HeartbeatReport>) -> NodeResponse {
        let Some(report) = report else {
            debug!(node_id = %self.node_id, "Heartbeat without container report");
            return NodeResponse::empty();
        };

        self.reconcile(&flatten_report(report))
    }

    /// Reconcile the node's reported containers with the tracked state.
    ///
    /// For each reported container, in order:
    /// 1. An allocated container becomes active.
    /// 2. A complete container leaves active and its resource is returned; it
    ///    is always listed as completed, even when it was already retired.
    /// 3. Any other container that is neither allocated nor active is unknown
    ///    and must be cleaned up.
    ///
    /// Queued cleanups and finished applications are drained into the
    /// response exactly once; a lost response is not redelivered.
    #[instrument(skip_all, fields(node_id = %self.node_id, reported = containers.len()))]
    pub fn reconcile(&self, containers: &[Container]) -> NodeResponse {
        let mut tracked = self.tracked.lock();

        let mut completed_containers = Vec::new();
        let mut containers_to_clean_up = Vec::new();
        let mut cleanup_ids = BTreeSet::new();

        for reported in containers {
            let id = reported.id;

            if let Some(container) = tracked.allocated.remove(&id) {
                tracked
                    .active
                    .insert(id, container.with_state(reported.state));
                info!(container_id = %id, hostname = %self.hostname, "Activated container");
            }

            if reported.is_complete() {
                if let Some(container) = tracked.active.remove(&id) {
                    tracked.retire(&container, &self.hostname);
                    info!(
                        container_id = %id,
                        hostname = %self.hostname,
                        num_containers = tracked.num_containers,
                        available = %tracked.ledger.available(),
                        "Completed container"
                    );
                } else {
                    debug!(container_id = %id, "Completion reported for retired container");
                }
                completed_containers.push(reported.clone());
                continue;
            }

            match tracked.active.get_mut(&id) {
                Some(container) => container.state = reported.state,
                None => {
                    warn!(
                        container_id = %id,
                        state = %reported.state,
                        hostname = %self.hostname,
                        "Node reported unknown container, scheduling cleanup"
                    );
                    if cleanup_ids.insert(id) {
                        containers_to_clean_up.push(reported.clone());
                    }
                }
            }
        }

        for (id, container) in std::mem::take(&mut tracked.to_clean) {
            if cleanup_ids.insert(id) {
                containers_to_clean_up.push(container);
            }
        }

        let finished_applications = std::mem::take(&mut tracked.finished_applications);
        tracked.last_reconciled_at = Some(Utc::now());

        debug!(
            completed = completed_containers.len(),
            to_clean_up = containers_to_clean_up.len(),
            finished_applications = finished_applications.len(),
            allocated = tracked.allocated.len(),
            active = tracked.active.len(),
            "Reconciled node report"
        );

        NodeResponse {
            finished_applications,
            completed_containers,
            containers_to_clean_up,
        }
    }

    /// Retire a container outside the heartbeat cycle (preemption, kill).
    ///
    /// Returns false, changing nothing, if the container is not tracked.
    pub fn release(&self, container_id: &ContainerId) -> bool {
        self.try_release(container_id).is_ok()
    }

    /// Like [`release`](Self::release), returning the retired record or the reason it was refused.
    #[instrument(skip_all, fields(node_id = %self.node_id, container_id = %container_id))]
    pub fn try_release(&self, container_id: &ContainerId) -> NodeStateResult<Container> {
        let mut tracked = self.tracked.lock();

        let removed = match tracked.active.remove(container_id) {
            Some(container) => Some(container),
            None => tracked.allocated.remove(container_id),
        };
        let Some(container) = removed else {
            error!(hostname = %self.hostname, "Invalid container released");
            return Err(NodeStateError::UnknownContainer(*container_id));
        };

        tracked.retire(&container, &self.hostname);
        tracked.to_clean.insert(container.id, container.clone());

        info!(
            hostname = %self.hostname,
            resource = ?container.resource,
            num_containers = tracked.num_containers,
            used = %tracked.ledger.used(),
            available = %tracked.ledger.available(),
            "Released container"
        );

        Ok(container)
    }

    /// Queue an application whose completion must be reported to the node.
    ///
    /// The application's containers are left alone. They go away through
    /// [`release`](Self::release) or are flagged as unknown by a later
    /// reconciliation.
    pub fn notify_finished_application(&self, application_id: ApplicationId) {
        let mut tracked = self.tracked.lock();
        tracked.finished_applications.push(application_id);
        debug!(
            node_id = %self.node_id,
            application_id = %application_id,
            pending = tracked.finished_applications.len(),
            "Queued finished application"
        );
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn network_location(&self) -> &str {
        &self.network_location
    }

    pub fn config(&self) -> &NodeStateConfig {
        &self.config
    }

    pub fn total_capability(&self) -> Resource {
        self.tracked.lock().ledger.total()
    }

    pub fn available_resource(&self) -> Resource {
        self.tracked.lock().ledger.available()
    }

    pub fn used_resource(&self) -> Resource {
        self.tracked.lock().ledger.used()
    }

    pub fn num_containers(&self) -> usize {
        self.tracked.lock().num_containers
    }

    pub fn allocated_container_ids(&self) -> Vec<ContainerId> {
        self.tracked.lock().allocated.keys().copied().collect()
    }

    pub fn active_container_ids(&self) -> Vec<ContainerId> {
        self.tracked.lock().active.keys().copied().collect()
    }

    /// Returns the tracked record of a container, allocated or active.
    pub fn container(&self, container_id: &ContainerId) -> Option<Container> {
        let tracked = self.tracked.lock();
        tracked
            .allocated
            .get(container_id)
            .or_else(|| tracked.active.get(container_id))
            .cloned()
    }

    pub fn pending_cleanup_count(&self) -> usize {
        self.tracked.lock().to_clean.len()
    }

    pub fn pending_finished_applications(&self) -> Vec<ApplicationId> {
        self.tracked.lock().finished_applications.clone()
    }

    pub fn last_reconciled_at(&self) -> Option<DateTime<Utc>> {
        self.tracked.lock().last_reconciled_at
    }

    /// Consistent copy of the node taken under a single lock acquisition.
    pub fn snapshot(&self) -> NodeSnapshot {
        let tracked = self.tracked.lock();
        NodeSnapshot {
            node_id: self.node_id,
            hostname: self.hostname.clone(),
            network_location: self.network_location.clone(),
            total_capability: tracked.ledger.total(),
            available_resource: tracked.ledger.available(),
            used_resource: tracked.ledger.used(),
            num_containers: tracked.num_containers,
            allocated_containers: tracked.allocated.keys().copied().collect(),
            active_containers: tracked.active.keys().copied().collect(),
            pending_cleanup: tracked.to_clean.keys().copied().collect(),
            pending_finished_applications: tracked.finished_applications.clone(),
            last_reconciled_at: tracked.last_reconciled_at,
        }
    }

    /// Verify ledger conservation, membership disjointness and the container count.
    pub fn check_invariants(&self) -> NodeStateResult<()> {
        let tracked = self.tracked.lock();

        tracked.ledger.check_conservation()?;

        if let Some(id) = tracked
            .allocated
            .keys()
            .find(|id| tracked.active.contains_key(id))
        {
            return Err(NodeStateError::MembershipOverlap(*id));
        }

        if let Some(id) = tracked.to_clean.keys().find(|id| tracked.is_tracked(id)) {
            return Err(NodeStateError::CleanupOverlap(*id));
        }

        let count = tracked.allocated.len() + tracked.active.len();
        if tracked.num_containers != count {
            return Err(NodeStateError::CountMismatch {
                counted: tracked.num_containers,
                tracked: count,
            });
        }

        Ok(())
    }
}

impl NodeInfo for NodeState {
    fn node_id(&self) -> NodeId {
        self.node_id
    }

    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn rack_name(&self) -> &str {
        &self.network_location
    }

    fn total_capability(&self) -> Resource {
        NodeState::total_capability(self)
    }

    fn available_resource(&self) -> Resource {
        NodeState::available_resource(self)
    }

    fn used_resource(&self) -> Resource {
        NodeState::used_resource(self)
    }

    fn num_containers(&self) -> usize {
        NodeState::num_containers(self)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracked = self.tracked.lock();
        write!(
            f,
            "host: {} #containers={} available={} used={}",
            self.hostname,
            tracked.num_containers,
            tracked.ledger.available(),
            tracked.ledger.used()
        )
    }
}

/// Point-in-time copy of a node for monitoring and reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub node_id: NodeId,
    pub hostname: String,
    pub network_location: String,
    pub total_capability: Resource,
    pub available_resource: Resource,
    pub used_resource: Resource,
    pub num_containers: usize,
    pub allocated_containers: Vec<ContainerId>,
    pub active_containers: Vec<ContainerId>,
    pub pending_cleanup: Vec<ContainerId>,
    pub pending_finished_applications: Vec<ApplicationId>,
    pub last_reconciled_at: Option<DateTime<Utc>>,
}
