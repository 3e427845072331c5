//! Container identifiers.
//!
//! A container is always owned by one application, so its ID is the pair
//! (application, sequence). The derived ordering compares the application
//! first, which keeps an application's containers adjacent in ordered maps.

use std::fmt;
use std::str::FromStr;

use crate::macros::{parse_ulid, split_prefixed};
use crate::{ApplicationId, IdError};

/// Identifier of a single container: owning application plus sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerId {
    application_id: ApplicationId,
    sequence: u32,
}

impl ContainerId {
    /// The prefix for container IDs.
    pub const PREFIX: &'static str = "ctr";

    #[must_use]
    pub const fn new(application_id: ApplicationId, sequence: u32) -> Self {
        Self {
            application_id,
            sequence,
        }
    }

    /// Returns the application that owns this container.
    #[must_use]
    pub const fn application_id(&self) -> ApplicationId {
        self.application_id
    }

    /// Returns the per-application sequence number.
    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Parses an ID in the format `ctr_{application ulid}_{sequence}`.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        let rest = split_prefixed(s, Self::PREFIX)?;

        let Some((ulid_str, seq_str)) = rest.rsplit_once('_') else {
            return Err(IdError::MissingSeparator);
        };

        let ulid = parse_ulid(ulid_str)?;
        let sequence = seq_str.parse::<u32>().map_err(|e| IdError::InvalidFormat {
            message: format!("container sequence '{seq_str}': {e}"),
        })?;

        Ok(Self::new(ApplicationId::from_ulid(ulid), sequence))
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            Self::PREFIX,
            self.application_id.ulid(),
            self.sequence
        )
    }
}

impl FromStr for ContainerId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for ContainerId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ContainerId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
