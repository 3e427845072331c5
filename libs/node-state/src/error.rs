//! Error types for node bookkeeping.

use tally_id::{ApplicationId, ContainerId, NodeId};
use thiserror::Error;

use crate::resource::Resource;

/// Result type for node state operations.
pub type NodeStateResult<T> = Result<T, NodeStateError>;

/// Errors reported by node state operations.
///
/// None of these are fatal. Every operation that returns one has left the
/// node state exactly as it was before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeStateError {
    /// An allocation was requested with no containers.
    #[error("no containers supplied for application {application_id}")]
    NoContainers { application_id: ApplicationId },

    /// A ledger operation was handed a container without a resource.
    #[error("missing resource for {operation} on {hostname}")]
    MissingResource {
        hostname: String,
        operation: &'static str,
    },

    /// The deduction would drive the available ledger negative under a strict policy.
    #[error("insufficient capacity on {hostname}: requested {requested}, available {available}")]
    InsufficientCapacity {
        hostname: String,
        requested: Resource,
        available: Resource,
    },

    /// The container is tracked neither as allocated nor as active.
    #[error("container {0} is not tracked on this node")]
    UnknownContainer(ContainerId),

    /// available + used no longer equals total.
    #[error("ledger imbalance: available {available} + used {used} != total {total}")]
    LedgerImbalance {
        total: Resource,
        available: Resource,
        used: Resource,
    },

    /// A container id appears in more than one membership set.
    #[error("container {0} is both allocated and active")]
    MembershipOverlap(ContainerId),

    /// A container queued for cleanup is still allocated or active.
    #[error("container {0} is queued for cleanup but still tracked")]
    CleanupOverlap(ContainerId),

    /// The container counter disagrees with the membership sets.
    #[error("container count {counted} does not match {tracked} tracked containers")]
    CountMismatch { counted: usize, tracked: usize },

    /// A node with this id is already registered.
    #[error("node {0} is already registered")]
    DuplicateNode(NodeId),

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NodeStateError {
    /// Returns true if the error describes a broken internal invariant
    /// rather than bad input from a caller.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::LedgerImbalance { .. }
                | Self::MembershipOverlap(_)
                | Self::CleanupOverlap(_)
                | Self::CountMismatch { .. }
        )
    }
}
