// crates/handler-chain-core/src/core/outcome.rs
// ============================================================================
// Module: Stage Outcomes
// Description: PASS/FAIL decisions and the per-stage outcome record.
// Purpose: Record exactly one immutable verdict per stage per run.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`StageOutcome`] is appended to the run log once per evaluated stage and
//! never modified afterwards. Decisions serialize as upper-case `PASS`/`FAIL`
//! to match the oracle wire format.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::StageId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Stage verdict.
///
/// # Invariants
/// - Wire forms are exactly `PASS` and `FAIL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    /// The stage lets the request through.
    Pass,
    /// The stage blocks the request.
    Fail,
}

impl Decision {
    /// Returns the wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }

    /// Parses an exact wire label, ignoring surrounding whitespace.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "PASS" => Some(Self::Pass),
            "FAIL" => Some(Self::Fail),
            _ => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Stage Outcome
// ============================================================================

/// Outcome of evaluating one stage against the run scenario.
///
/// # Invariants
/// - Created exactly once per stage per run; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOutcome {
    /// Identifier of the evaluated stage.
    pub handler: StageId,
    /// Verdict for the stage.
    pub decision: Decision,
    /// Free-text justification.
    pub reason: String,
    /// Simulated log code (for example `OK_200`).
    pub code: String,
    /// Time the verdict was observed.
    pub observed_at: Timestamp,
}
