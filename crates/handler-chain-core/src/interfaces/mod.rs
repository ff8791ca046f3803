// crates/handler-chain-core/src/interfaces/mod.rs
// ============================================================================
// Module: Handler Chain Interfaces
// Description: Seams for the decision oracle, progress observers, and clocks.
// Purpose: Define the contract surfaces used by the pipeline runner.
// Dependencies: async-trait, thiserror, crate::core
// ============================================================================

//! ## Overview
//! Interfaces keep the runner independent of how verdicts are produced and how
//! progress is displayed. An oracle may be a remote model or a rule engine; an
//! observer may render a console or write audit records.
//!
//! Oracle output is untrusted: the runner validates every verdict and treats
//! any error as a fallback FAIL outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::Decision;
use crate::core::HandlerStage;
use crate::core::RunStatus;
use crate::core::Scenario;
use crate::core::StageOutcome;
use crate::core::Timestamp;

// ============================================================================
// SECTION: Decision Oracle
// ============================================================================

/// Verdict returned by a decision oracle for one stage.
///
/// # Invariants
/// - `reason` and `code` must be non-blank to be accepted by the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleVerdict {
    /// PASS/FAIL decision.
    pub decision: Decision,
    /// Free-text justification.
    pub reason: String,
    /// Simulated log code.
    pub code: String,
}

impl OracleVerdict {
    /// Creates a verdict.
    #[must_use]
    pub fn new(decision: Decision, reason: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            decision,
            reason: reason.into(),
            code: code.into(),
        }
    }

    /// Checks that required text fields are present.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError::MalformedResponse`] when `reason` or `code` is blank.
    pub fn validate(&self) -> Result<(), OracleError> {
        if self.reason.trim().is_empty() {
            return Err(OracleError::MalformedResponse("verdict reason is blank".to_string()));
        }
        if self.code.trim().is_empty() {
            return Err(OracleError::MalformedResponse("verdict code is blank".to_string()));
        }
        Ok(())
    }
}

/// Decision oracle errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Every variant maps to the same fallback outcome in the runner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// Transport failure, non-success status, or missing credentials.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    /// Response parsed but was empty or violated the verdict schema.
    #[error("oracle response malformed: {0}")]
    MalformedResponse(String),
    /// The call did not resolve within the configured bound.
    #[error("oracle call timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
}

/// External source of PASS/FAIL verdicts.
///
/// Implementations are stateless from the runner's perspective: one call per
/// stage per run, no retries, no caching.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    /// Evaluates the named handler against the scenario text.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] when no valid verdict can be produced.
    async fn evaluate(
        &self,
        handler_name: &str,
        scenario: &str,
    ) -> Result<OracleVerdict, OracleError>;
}

// ============================================================================
// SECTION: Run Observer
// ============================================================================

/// Progress events emitted by the runner.
///
/// # Invariants
/// - `generation` identifies the run; a reset always advances it.
/// - Events are emitted after the state lock is released.
#[derive(Debug, Clone, Copy)]
pub enum RunEvent<'a> {
    /// A run began.
    RunStarted {
        /// Run generation.
        generation: u64,
        /// Scenario under evaluation.
        scenario: &'a Scenario,
    },
    /// A stage became the current stage.
    StageStarted {
        /// Run generation.
        generation: u64,
        /// Catalog index of the stage.
        index: usize,
        /// Stage being evaluated.
        stage: &'a HandlerStage,
    },
    /// The oracle failed and the fallback outcome will be used.
    OracleFallback {
        /// Run generation.
        generation: u64,
        /// Stage being evaluated.
        stage: &'a HandlerStage,
        /// Oracle failure.
        error: &'a OracleError,
    },
    /// An outcome was appended to the run state.
    OutcomeRecorded {
        /// Run generation.
        generation: u64,
        /// Catalog index of the stage.
        index: usize,
        /// Recorded outcome.
        outcome: &'a StageOutcome,
    },
    /// The run reached a terminal status.
    RunFinished {
        /// Run generation.
        generation: u64,
        /// Terminal status.
        status: RunStatus,
    },
    /// A continuation from a reset run was dropped.
    StaleDiscarded {
        /// Generation of the stale run.
        generation: u64,
        /// Stage whose result was discarded.
        stage: &'a HandlerStage,
    },
    /// The runner returned to idle.
    Reset {
        /// Generation now current.
        generation: u64,
    },
}

/// Receiver of run progress events.
pub trait RunObserver: Send + Sync {
    /// Handles one event. Must not block for long; it runs on the run task.
    fn on_event(&self, event: &RunEvent<'_>);
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of outcome timestamps.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}
