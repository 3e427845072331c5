//! Prefixed identifier types for nodes and applications.

use crate::macros::define_id;
use crate::ContainerId;

define_id!(NodeId, "node");
define_id!(ApplicationId, "app");

impl ApplicationId {
    /// Returns the ID of this application's container with the given sequence number.
    #[must_use]
    pub const fn container(&self, sequence: u32) -> ContainerId {
        ContainerId::new(*self, sequence)
    }
}
