//! Per-node bookkeeping for a cluster resource scheduler.
//!
//! For every worker node the scheduler keeps a [`NodeState`]: the node's
//! resource ledger, the containers allocated to it, the containers it has
//! confirmed running, and the cleanup and purge instructions it has not been
//! sent yet. Key flows:
//!
//! - **Allocate**: the placement algorithm records containers and capacity is
//!   deducted immediately.
//! - **Reconcile**: each heartbeat's container report promotes, completes or
//!   flags containers, and drains pending instructions into a [`NodeResponse`].
//! - **Release**: preemption and kills retire containers between heartbeats.
//!
//! # Invariants
//!
//! - `available + used == total` after every mutation with well-formed resources
//! - A container is never both allocated and active
//! - Cleanup and finished-application queues are delivered at most once

mod config;
mod container;
mod error;
mod ledger;
mod node;
mod registry;
mod resource;
mod response;

pub use config::{LedgerPolicy, NodeStateConfig, LEDGER_POLICY_ENV};
pub use container::{Container, ContainerState};
pub use error::{NodeStateError, NodeStateResult};
pub use node::{NodeInfo, NodeSnapshot, NodeState};
pub use registry::NodeRegistry;
pub use resource::Resource;
pub use response::{flatten_report, HeartbeatReport, NodeResponse};

pub use tally_id::{ApplicationId, ContainerId, NodeId};
