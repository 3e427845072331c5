//! Test support shared across the workspace.
//!
//! - [`init_tracing`] installs a test-friendly subscriber once per process
//! - Deterministic IDs so assertions on ordering do not depend on the clock

use std::sync::Once;

use tally_id::{ApplicationId, NodeId, Ulid};
use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

/// Install a fmt subscriber writing through the test harness.
///
/// Honours `RUST_LOG`, defaulting to `warn`. Safe to call from every test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Application id whose ordering follows `n`.
pub fn application_id(n: u64) -> ApplicationId {
    ApplicationId::from_ulid(Ulid::from_parts(n, 0))
}

/// Node id whose ordering follows `n`.
pub fn node_id(n: u64) -> NodeId {
    NodeId::from_ulid(Ulid::from_parts(n, 0))
}
