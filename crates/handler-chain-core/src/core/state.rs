// crates/handler-chain-core/src/core/state.rs
// ============================================================================
// Module: Handler Chain Run State
// Description: Run lifecycle status, live state snapshot, and run reports.
// Purpose: Capture the observable progress of one simulation.
// Dependencies: crate::core::{outcome, scenario}, serde
// ============================================================================

//! ## Overview
//! [`RunState`] is the single mutable record of a simulation. It is owned by
//! the runner and handed to renderers as a cloned snapshot. A fresh run
//! discards the previous state entirely; there is no history across runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::outcome::Decision;
use crate::core::outcome::StageOutcome;
use crate::core::scenario::Scenario;

// ============================================================================
// SECTION: Run Status
// ============================================================================

/// Run lifecycle status.
///
/// # Invariants
/// - `Completed` and `ShortCircuited` are terminal until reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No run has started since the last reset.
    #[default]
    Idle,
    /// Stages are being evaluated.
    Running,
    /// Every stage passed.
    Completed,
    /// A stage failed and evaluation stopped.
    ShortCircuited,
}

impl RunStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::ShortCircuited => "short_circuited",
        }
    }
}

// ============================================================================
// SECTION: Run State
// ============================================================================

/// Live state of the current simulation.
///
/// # Invariants
/// - At a terminal status, `outcomes.len() == current_stage_index + 1`.
/// - While running, `current_stage_index` names the in-flight stage and
///   `outcomes.len()` is that index (awaiting a verdict) or that index + 1.
/// - Outcome `i` always belongs to catalog stage `i`.
/// - Only `ShortCircuited` runs contain a FAIL outcome, and only as the last one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Index of the stage currently (or last) evaluated; `None` when idle.
    pub current_stage_index: Option<usize>,
    /// Outcomes in catalog order.
    pub outcomes: Vec<StageOutcome>,
    /// Lifecycle status.
    pub status: RunStatus,
}

impl RunState {
    /// Returns the idle state.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Returns a fresh running state with no outcomes.
    #[must_use]
    pub const fn running() -> Self {
        Self {
            current_stage_index: None,
            outcomes: Vec::new(),
            status: RunStatus::Running,
        }
    }

    /// Returns the first failing outcome, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|outcome| outcome.decision == Decision::Fail)
    }
}

// ============================================================================
// SECTION: Run Report
// ============================================================================

/// How a call to `start` ended from the caller's point of view.
///
/// # Invariants
/// - `Cancelled` means the run was reset before reaching a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every stage passed.
    Completed,
    /// A stage failed.
    ShortCircuited,
    /// The run was reset while in flight.
    Cancelled,
}

/// Summary returned by `start` once its run ends.
///
/// # Invariants
/// - `outcomes` holds only outcomes that were appended to the live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Scenario the run evaluated.
    pub scenario: Scenario,
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Outcomes recorded by this run, in catalog order.
    pub outcomes: Vec<StageOutcome>,
}
