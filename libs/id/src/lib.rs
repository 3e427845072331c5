//! # tally-id
//!
//! Typed identifiers for the per-node container tracker.
//!
//! ## ID Format
//!
//! Nodes and applications use a prefixed ULID: `{prefix}_{ulid}`.
//! Containers are derived from their owning application plus a sequence
//! number: `ctr_{application ulid}_{sequence}`.
//!
//! Examples:
//! - `node_01HV4Z2WQXKJNM8GPQY6VBKC3D`
//! - `app_01HV4Z3MXNKPQR9HSTZ7WCLD4E`
//! - `ctr_01HV4Z3MXNKPQR9HSTZ7WCLD4E_7`
//!
//! All IDs are totally ordered. Container IDs sort by application first and
//! sequence second, so the containers of one application are contiguous.

mod container;
mod error;
mod macros;
mod types;

pub use container::ContainerId;
pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
