//! Node state configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NodeStateError, NodeStateResult};

/// Environment variable selecting the ledger policy.
pub const LEDGER_POLICY_ENV: &str = "TALLY_LEDGER_POLICY";

/// How the ledger treats deductions that exceed the available resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerPolicy {
    /// Over-allocation is accepted and shows up as a negative available
    /// resource. The placement algorithm is trusted not to over-commit.
    #[default]
    Permissive,

    /// Deductions that would leave any component of the available resource
    /// negative are rejected without touching the ledger.
    Strict,
}

impl LedgerPolicy {
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Strict)
    }
}

impl fmt::Display for LedgerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Permissive => f.write_str("permissive"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for LedgerPolicy {
    type Err = NodeStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(NodeStateError::InvalidConfig(format!(
                "{LEDGER_POLICY_ENV} must be 'permissive' or 'strict', got '{other}'"
            ))),
        }
    }
}

/// Node state configuration (env-driven).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStateConfig {
    /// Ledger policy applied to allocations.
    pub ledger_policy: LedgerPolicy,
}

impl NodeStateConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> NodeStateResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> NodeStateResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ledger_policy = lookup(LEDGER_POLICY_ENV)
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or_default();

        Ok(Self { ledger_policy })
    }
}
