//! Heartbeat input and reconciliation output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tally_id::ApplicationId;

use crate::container::Container;

/// Containers reported by one node heartbeat, keyed by reporting source
/// (typically one entry per application).
pub type HeartbeatReport = BTreeMap<String, Vec<Container>>;

/// Flattens a heartbeat report into the single list reconciliation consumes.
///
/// Sources are visited in key order, containers in report order.
pub fn flatten_report(report: &HeartbeatReport) -> Vec<Container> {
    report.values().flatten().cloned().collect()
}

/// What the transport layer must tell the node, and the application tracker,
/// after one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResponse {
    /// Applications whose completion must be purged on the node.
    pub finished_applications: Vec<ApplicationId>,

    /// Containers the node reported as complete.
    pub completed_containers: Vec<Container>,

    /// Containers the node must kill or discard.
    pub containers_to_clean_up: Vec<Container>,
}

impl NodeResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if the response carries no instruction at all.
    pub fn is_empty(&self) -> bool {
        self.finished_applications.is_empty()
            && self.completed_containers.is_empty()
            && self.containers_to_clean_up.is_empty()
    }
}
