//! Registry of tracked nodes.
//!
//! The registry lock only guards the id → node map. Handles are returned as
//! `Arc<NodeState>`, so callers operate on a node under that node's own lock
//! and work on different nodes never contends.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tally_id::NodeId;
use tracing::{info, warn};

use crate::error::{NodeStateError, NodeStateResult};
use crate::node::NodeState;

#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: RwLock<BTreeMap<NodeId, Arc<NodeState>>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a node. Fails if the node id is already registered.
    pub fn register(&self, node: NodeState) -> NodeStateResult<Arc<NodeState>> {
        let node_id = node.node_id();
        let mut nodes = self.nodes.write();

        if nodes.contains_key(&node_id) {
            warn!(node_id = %node_id, "Node already registered");
            return Err(NodeStateError::DuplicateNode(node_id));
        }

        let node = Arc::new(node);
        nodes.insert(node_id, Arc::clone(&node));
        info!(
            node_id = %node_id,
            hostname = %node.hostname(),
            registered = nodes.len(),
            "Registered node"
        );
        Ok(node)
    }

    pub fn get(&self, node_id: &NodeId) -> Option<Arc<NodeState>> {
        self.nodes.read().get(node_id).cloned()
    }

    /// Stop tracking a decommissioned node, returning its final state.
    pub fn deregister(&self, node_id: &NodeId) -> Option<Arc<NodeState>> {
        let removed = self.nodes.write().remove(node_id);
        if let Some(node) = &removed {
            info!(
                node_id = %node_id,
                hostname = %node.hostname(),
                num_containers = node.num_containers(),
                "Deregistered node"
            );
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.read().keys().copied().collect()
    }

    /// Handles to every registered node, ordered by node id.
    pub fn nodes(&self) -> Vec<Arc<NodeState>> {
        self.nodes.read().values().cloned().collect()
    }
}
