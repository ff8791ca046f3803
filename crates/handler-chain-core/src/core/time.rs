// crates/handler-chain-core/src/core/time.rs
// ============================================================================
// Module: Handler Chain Time Model
// Description: Timestamp representation for stage outcomes.
// Purpose: Keep outcome timestamps explicit and injectable.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Stage outcomes carry the time at which the verdict was observed. The runner
//! never reads wall-clock time itself; it asks an injected
//! [`Clock`](crate::interfaces::Clock), which lets tests pin timestamps.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Timestamp attached to stage outcomes.
///
/// # Invariants
/// - Values are supplied by a clock; no monotonicity is enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }
}
