//! Resource ledger for one node.
//!
//! The ledger is owned by a single [`NodeState`](crate::NodeState) and is only
//! touched while that node's lock is held. Callers outside the crate only ever
//! see copies of its vectors.
//!
//! # Invariants
//!
//! - `available + used == total` after every successful operation
//! - A rejected operation leaves all three vectors untouched

use tracing::error;

use crate::config::LedgerPolicy;
use crate::error::{NodeStateError, NodeStateResult};
use crate::resource::Resource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Ledger {
    total: Resource,
    available: Resource,
    used: Resource,
    policy: LedgerPolicy,
}

impl Ledger {
    pub(crate) fn new(total: Resource, policy: LedgerPolicy) -> Self {
        Self {
            total,
            available: total,
            used: Resource::ZERO,
            policy,
        }
    }

    pub(crate) fn total(&self) -> Resource {
        self.total
    }

    pub(crate) fn available(&self) -> Resource {
        self.available
    }

    pub(crate) fn used(&self) -> Resource {
        self.used
    }

    /// Checks whether a deduction of `requested` would be accepted.
    pub(crate) fn check_deduction(&self, requested: Resource, hostname: &str) -> NodeStateResult<()> {
        if self.policy.is_strict() && !requested.fits_in(&self.available) {
            return Err(NodeStateError::InsufficientCapacity {
                hostname: hostname.to_string(),
                requested,
                available: self.available,
            });
        }
        Ok(())
    }

    /// Moves `resource` from available to used.
    pub(crate) fn deduct_resource(&mut self, resource: Option<Resource>, hostname: &str) -> NodeStateResult<()> {
        let Some(resource) = resource else {
            error!(hostname, "Invalid deduction of missing resource");
            return Err(NodeStateError::MissingResource {
                hostname: hostname.to_string(),
                operation: "deduction",
            });
        };

        if let Err(e) = self.check_deduction(resource, hostname) {
            error!(
                hostname,
                requested = %resource,
                available = %self.available,
                "Rejected deduction beyond available resource"
            );
            return Err(e);
        }

        self.available -= resource;
        self.used += resource;
        Ok(())
    }

    /// Moves `resource` from used back to available.
    pub(crate) fn add_resource(&mut self, resource: Option<Resource>, hostname: &str) -> NodeStateResult<()> {
        let Some(resource) = resource else {
            error!(hostname, "Invalid addition of missing resource");
            return Err(NodeStateError::MissingResource {
                hostname: hostname.to_string(),
                operation: "addition",
            });
        };

        self.available += resource;
        self.used -= resource;
        Ok(())
    }

    pub(crate) fn check_conservation(&self) -> NodeStateResult<()> {
        if self.available + self.used != self.total {
            return Err(NodeStateError::LedgerImbalance {
                total: self.total,
                available: self.available,
                used: self.used,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "host-a";

    #[test]
    fn test_new_ledger_is_all_available() {
        let ledger = Ledger::new(Resource::new(1000, 8), LedgerPolicy::Permissive);
        assert_eq!(ledger.available(), Resource::new(1000, 8));
        assert_eq!(ledger.used(), Resource::ZERO);
        assert!(ledger.check_conservation().is_ok());
    }

    #[test]
    fn test_deduct_and_add_resource() {
        let mut ledger = Ledger::new(Resource::memory(1000), LedgerPolicy::Permissive);

        ledger.deduct_resource(Some(Resource::memory(200)), HOST).unwrap();
        assert_eq!(ledger.available(), Resource::memory(800));
        assert_eq!(ledger.used(), Resource::memory(200));
        assert!(ledger.check_conservation().is_ok());

        ledger.add_resource(Some(Resource::memory(200)), HOST).unwrap();
        assert_eq!(ledger.available(), Resource::memory(1000));
        assert_eq!(ledger.used(), Resource::ZERO);
    }

    #[test]
    fn test_missing_resource_is_rejected_on_both_paths() {
        let mut ledger = Ledger::new(Resource::memory(1000), LedgerPolicy::Permissive);
        let before = ledger.clone();

        let err = ledger.deduct_resource(None, HOST).unwrap_err();
        assert!(matches!(err, NodeStateError::MissingResource { operation: "deduction", .. }));
        assert_eq!(ledger, before);

        let err = ledger.add_resource(None, HOST).unwrap_err();
        assert!(matches!(err, NodeStateError::MissingResource { operation: "addition", .. }));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_permissive_allows_overcommit() {
        let mut ledger = Ledger::new(Resource::memory(100), LedgerPolicy::Permissive);
        ledger.deduct_resource(Some(Resource::memory(300)), HOST).unwrap();
        assert_eq!(ledger.available(), Resource::memory(-200));
        assert!(ledger.check_conservation().is_ok());
    }

    #[test]
    fn test_strict_rejects_overcommit() {
        let mut ledger = Ledger::new(Resource::memory(100), LedgerPolicy::Strict);
        let before = ledger.clone();

        let err = ledger.deduct_resource(Some(Resource::memory(300)), HOST).unwrap_err();
        assert!(matches!(err, NodeStateError::InsufficientCapacity { .. }));
        assert_eq!(ledger, before);

        ledger.deduct_resource(Some(Resource::memory(100)), HOST).unwrap();
        assert_eq!(ledger.available(), Resource::ZERO);
    }

    #[test]
    fn test_conservation_detects_imbalance() {
        let mut ledger = Ledger::new(Resource::memory(100), LedgerPolicy::Permissive);
        ledger.used = Resource::memory(5);
        let err = ledger.check_conservation().unwrap_err();
        assert!(err.is_invariant_violation());
    }
}
