// crates/handler-chain-core/src/runtime/runner.rs
// ============================================================================
// Module: Pipeline Runner
// Description: Sequential, short-circuiting driver for the handler catalog.
// Purpose: Evaluate stages one at a time through the decision oracle.
// Dependencies: crate::core, crate::interfaces, thiserror, tokio
// ============================================================================

//! ## Overview
//! [`PipelineRunner`] owns the single [`RunState`] of the simulator. A call to
//! [`PipelineRunner::start`] walks the catalog in order, awaits one oracle
//! verdict per stage, appends an outcome, and stops at the first FAIL.
//! [`PipelineRunner::reset`] may be called at any time from another task.
//!
//! ## Invariants
//! - The state lock is never held across an await.
//! - Every continuation re-checks the run generation before touching state;
//!   a reset advances the generation, so stale oracle results are dropped.
//! - A reset also wakes the run task, which abandons its pending oracle call
//!   or stage delay instead of waiting for it to resolve.
//! - Fallback notices are only emitted for outcomes that were recorded.
//! - Oracle errors, timeouts, and blank verdict fields all produce the same
//!   fallback FAIL outcome with code [`FALLBACK_CODE`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use crate::core::Decision;
use crate::core::HandlerStage;
use crate::core::RunOutcome;
use crate::core::RunReport;
use crate::core::RunState;
use crate::core::RunStatus;
use crate::core::Scenario;
use crate::core::StageCatalog;
use crate::core::StageOutcome;
use crate::interfaces::Clock;
use crate::interfaces::DecisionOracle;
use crate::interfaces::OracleError;
use crate::interfaces::OracleVerdict;
use crate::interfaces::RunEvent;
use crate::interfaces::RunObserver;
use crate::runtime::clock::SystemClock;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Log code attached to fallback outcomes.
pub const FALLBACK_CODE: &str = "SYSTEM_ERR_AI";
/// Reason attached to fallback outcomes unless a localized one is configured.
pub const DEFAULT_FALLBACK_REASON: &str = "AI engine connection error. Please try again later.";
/// Pause between a passing stage and the next one.
pub const DEFAULT_STAGE_DELAY: Duration = Duration::from_millis(800);

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Runner tuning knobs.
///
/// # Invariants
/// - `stage_delay` is presentation only; zero is valid and used headless.
/// - `oracle_timeout = None` leaves timeouts to the oracle itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Pause inserted after each passing stage that has a successor.
    pub stage_delay: Duration,
    /// Optional upper bound on each oracle call.
    pub oracle_timeout: Option<Duration>,
    /// Reason text used for fallback outcomes.
    pub fallback_reason: String,
}

impl RunnerConfig {
    /// Configuration without presentation delay, for tests and batch runs.
    #[must_use]
    pub fn headless() -> Self {
        Self {
            stage_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            stage_delay: DEFAULT_STAGE_DELAY,
            oracle_timeout: None,
            fallback_reason: DEFAULT_FALLBACK_REASON.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Runner invocation errors.
///
/// # Invariants
/// - Returned without modifying the run state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunnerError {
    /// `start` was called while a run is in progress.
    #[error("a pipeline run is already in progress")]
    AlreadyRunning,
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Mutable runner state guarded by the runner mutex.
#[derive(Debug, Default)]
struct RunnerInner {
    /// Live run state.
    state: RunState,
    /// Identifier of the active run; advanced by every start and reset.
    generation: u64,
}

/// Sequential driver for the handler chain.
///
/// Share it behind an [`Arc`] to call [`PipelineRunner::reset`] while a run is
/// being awaited elsewhere.
pub struct PipelineRunner {
    /// Stages evaluated in order.
    catalog: StageCatalog,
    /// Verdict source.
    oracle: Arc<dyn DecisionOracle>,
    /// Timestamp source for outcomes.
    clock: Arc<dyn Clock>,
    /// Progress observers.
    observers: Vec<Arc<dyn RunObserver>>,
    /// Runner configuration.
    config: RunnerConfig,
    /// Guarded run state.
    inner: Mutex<RunnerInner>,
    /// Publishes the generation installed by each reset.
    resets: watch::Sender<u64>,
}

impl PipelineRunner {
    /// Creates an idle runner using the system clock and no observers.
    #[must_use]
    pub fn new(
        catalog: StageCatalog,
        oracle: Arc<dyn DecisionOracle>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            catalog,
            oracle,
            clock: Arc::new(SystemClock),
            observers: Vec::new(),
            config,
            inner: Mutex::new(RunnerInner::default()),
            resets: watch::Sender::new(0),
        }
    }

    /// Replaces the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Adds a progress observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Returns the stage catalog.
    #[must_use]
    pub const fn catalog(&self) -> &StageCatalog {
        &self.catalog
    }

    /// Returns a copy of the live run state.
    #[must_use]
    pub fn snapshot(&self) -> RunState {
        self.lock().state.clone()
    }

    /// Returns true while a run is in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock().state.status == RunStatus::Running
    }

    /// Runs the catalog against `scenario`.
    ///
    /// Returns once the run completes, short-circuits, or is cancelled by a
    /// concurrent [`PipelineRunner::reset`].
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::AlreadyRunning`] when a run is in progress; the
    /// live state is left untouched.
    pub async fn start(&self, scenario: &Scenario) -> Result<RunReport, RunnerError> {
        let (generation, mut resets) = self.begin()?;
        self.notify(&RunEvent::RunStarted {
            generation,
            scenario,
        });

        let last_index = self.catalog.len().saturating_sub(1);
        let mut recorded = Vec::with_capacity(self.catalog.len());
        for (index, stage) in self.catalog.iter().enumerate() {
            if !self.enter_stage(generation, index) {
                return Ok(cancelled(scenario, recorded));
            }
            self.notify(&RunEvent::StageStarted {
                generation,
                index,
                stage,
            });

            let consulted = tokio::select! {
                biased;
                _ = resets.changed() => None,
                result = self.consult(stage, scenario) => Some(result),
            };
            let (outcome, failure) = match consulted {
                Some(Ok(verdict)) => (self.outcome_from(stage, verdict), None),
                Some(Err(error)) => (self.fallback_outcome(stage), Some(error)),
                None => {
                    self.notify(&RunEvent::StaleDiscarded {
                        generation,
                        stage,
                    });
                    return Ok(cancelled(scenario, recorded));
                }
            };

            let Some(status) = self.record(generation, index, &outcome) else {
                self.notify(&RunEvent::StaleDiscarded {
                    generation,
                    stage,
                });
                return Ok(cancelled(scenario, recorded));
            };
            if let Some(error) = &failure {
                self.notify(&RunEvent::OracleFallback {
                    generation,
                    stage,
                    error,
                });
            }
            self.notify(&RunEvent::OutcomeRecorded {
                generation,
                index,
                outcome: &outcome,
            });
            recorded.push(outcome);

            if status == RunStatus::ShortCircuited {
                self.notify(&RunEvent::RunFinished {
                    generation,
                    status,
                });
                return Ok(RunReport {
                    scenario: scenario.clone(),
                    outcome: RunOutcome::ShortCircuited,
                    outcomes: recorded,
                });
            }
            if index < last_index && !self.config.stage_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = resets.changed() => {}
                    () = tokio::time::sleep(self.config.stage_delay) => {}
                }
            }
        }

        if !self.finish(generation) {
            return Ok(cancelled(scenario, recorded));
        }
        self.notify(&RunEvent::RunFinished {
            generation,
            status: RunStatus::Completed,
        });
        Ok(RunReport {
            scenario: scenario.clone(),
            outcome: RunOutcome::Completed,
            outcomes: recorded,
        })
    }

    /// Returns the runner to idle, cancelling any in-flight run.
    ///
    /// Always legal and idempotent with respect to the observable state.
    pub fn reset(&self) {
        let generation = {
            let mut inner = self.lock();
            inner.generation = inner.generation.wrapping_add(1);
            inner.state = RunState::idle();
            self.resets.send_replace(inner.generation);
            inner.generation
        };
        self.notify(&RunEvent::Reset {
            generation,
        });
    }

    // ------------------------------------------------------------------------
    // State transitions
    // ------------------------------------------------------------------------

    /// Moves to `Running`, claims a new generation, and subscribes to resets.
    ///
    /// The receiver is created under the state lock, so any reset observed
    /// through it happened after this run began.
    fn begin(&self) -> Result<(u64, watch::Receiver<u64>), RunnerError> {
        let mut inner = self.lock();
        if inner.state.status == RunStatus::Running {
            return Err(RunnerError::AlreadyRunning);
        }
        inner.generation = inner.generation.wrapping_add(1);
        inner.state = RunState::running();
        Ok((inner.generation, self.resets.subscribe()))
    }

    /// Marks `index` as the current stage if the run is still active.
    fn enter_stage(&self, generation: u64, index: usize) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        inner.state.current_stage_index = Some(index);
        true
    }

    /// Appends `outcome` if the run is still active and returns the new status.
    fn record(&self, generation: u64, index: usize, outcome: &StageOutcome) -> Option<RunStatus> {
        let mut inner = self.lock();
        if inner.generation != generation {
            return None;
        }
        debug_assert_eq!(inner.state.outcomes.len(), index);
        inner.state.current_stage_index = Some(index);
        inner.state.outcomes.push(outcome.clone());
        if outcome.decision == Decision::Fail {
            inner.state.status = RunStatus::ShortCircuited;
        }
        Some(inner.state.status)
    }

    /// Marks the run completed if it is still active.
    fn finish(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        inner.state.status = RunStatus::Completed;
        true
    }

    // ------------------------------------------------------------------------
    // Oracle handling
    // ------------------------------------------------------------------------

    /// Calls the oracle for one stage and validates the verdict.
    async fn consult(
        &self,
        stage: &HandlerStage,
        scenario: &Scenario,
    ) -> Result<OracleVerdict, OracleError> {
        let call = self.oracle.evaluate(&stage.display_name, scenario.as_str());
        let verdict = match self.config.oracle_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| OracleError::Timeout(limit))??,
            None => call.await?,
        };
        verdict.validate()?;
        Ok(verdict)
    }

    /// Builds an outcome from an accepted verdict.
    fn outcome_from(&self, stage: &HandlerStage, verdict: OracleVerdict) -> StageOutcome {
        StageOutcome {
            handler: stage.identifier.clone(),
            decision: verdict.decision,
            reason: verdict.reason,
            code: verdict.code,
            observed_at: self.clock.now(),
        }
    }

    /// Builds the fixed fallback FAIL outcome.
    fn fallback_outcome(&self, stage: &HandlerStage) -> StageOutcome {
        StageOutcome {
            handler: stage.identifier.clone(),
            decision: Decision::Fail,
            reason: self.config.fallback_reason.clone(),
            code: FALLBACK_CODE.to_string(),
            observed_at: self.clock.now(),
        }
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Locks the inner state, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, RunnerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forwards an event to every observer.
    fn notify(&self, event: &RunEvent<'_>) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

/// Builds the report for a run that was reset before finishing.
fn cancelled(scenario: &Scenario, outcomes: Vec<StageOutcome>) -> RunReport {
    RunReport {
        scenario: scenario.clone(),
        outcome: RunOutcome::Cancelled,
        outcomes,
    }
}
