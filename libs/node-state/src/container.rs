//! Container records as the scheduler and the node see them.

use std::fmt;

use serde::{Deserialize, Serialize};
use tally_id::{ApplicationId, ContainerId};

use crate::resource::Resource;

/// Last reported lifecycle state of a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerState {
    /// Assigned by the scheduler, not yet confirmed by the node.
    #[default]
    Allocated,

    /// Confirmed running on the node.
    Running,

    /// Finished on the node.
    Complete,
}

impl ContainerState {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocated => f.write_str("allocated"),
            Self::Running => f.write_str("running"),
            Self::Complete => f.write_str("complete"),
        }
    }
}

/// A unit of scheduled work on a node.
///
/// `resource` is `None` only for malformed records; the ledger refuses to
/// move resources for such a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub resource: Option<Resource>,
    pub state: ContainerState,
}

impl Container {
    /// Creates a freshly allocated container.
    pub fn new(id: ContainerId, resource: Resource) -> Self {
        Self {
            id,
            resource: Some(resource),
            state: ContainerState::Allocated,
        }
    }

    /// Returns a copy of this container carrying a different reported state.
    #[must_use]
    pub fn with_state(&self, state: ContainerState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }

    pub fn application_id(&self) -> ApplicationId {
        self.id.application_id()
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource {
            Some(resource) => write!(f, "{} [{}] {}", self.id, self.state, resource),
            None => write!(f, "{} [{}] <no resource>", self.id, self.state),
        }
    }
}
