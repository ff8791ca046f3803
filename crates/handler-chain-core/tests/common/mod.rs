// crates/handler-chain-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared oracles, clocks, and observers for runner tests.
// Purpose: Provide deterministic doubles for the runner's injected seams.
// Dependencies: handler-chain-core, tokio
// ============================================================================

//! ## Overview
//! Test doubles for [`DecisionOracle`], [`Clock`], and [`RunObserver`]. Oracles
//! record every call so tests can assert evaluation order and call counts.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::unwrap_in_result,
    reason = "Test fixtures favor direct unwraps for setup clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use handler_chain_core::Clock;
use handler_chain_core::Decision;
use handler_chain_core::DecisionOracle;
use handler_chain_core::OracleError;
use handler_chain_core::OracleVerdict;
use handler_chain_core::PipelineRunner;
use handler_chain_core::RunEvent;
use handler_chain_core::RunObserver;
use handler_chain_core::RunnerConfig;
use handler_chain_core::StageCatalog;
use handler_chain_core::Timestamp;
use tokio::sync::Notify;

// ============================================================================
// SECTION: Verdict Helpers
// ============================================================================

/// Passing verdict with a stock reason and code.
pub fn pass() -> OracleVerdict {
    OracleVerdict::new(Decision::Pass, "request accepted", "OK_200")
}

/// Failing verdict with the given code.
pub fn fail(code: &str) -> OracleVerdict {
    OracleVerdict::new(Decision::Fail, "request blocked", code)
}

// ============================================================================
// SECTION: Oracles
// ============================================================================

/// Oracle answering from a per-handler script; unscripted handlers pass.
pub struct ScriptOracle {
    script: BTreeMap<String, Result<OracleVerdict, OracleError>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptOracle {
    pub fn new() -> Self {
        Self {
            script: BTreeMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn answer(mut self, handler: &str, result: Result<OracleVerdict, OracleError>) -> Self {
        self.script.insert(handler.to_string(), result);
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn handlers_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|(handler, _)| handler).collect()
    }
}

#[async_trait]
impl DecisionOracle for ScriptOracle {
    async fn evaluate(
        &self,
        handler_name: &str,
        scenario: &str,
    ) -> Result<OracleVerdict, OracleError> {
        self.calls.lock().unwrap().push((handler_name.to_string(), scenario.to_string()));
        self.script.get(handler_name).cloned().unwrap_or_else(|| Ok(pass()))
    }
}

/// Oracle that always fails with a transport error.
pub struct DownOracle {
    pub calls: AtomicUsize,
}

impl DownOracle {
    pub const fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl DecisionOracle for DownOracle {
    async fn evaluate(
        &self,
        _handler_name: &str,
        _scenario: &str,
    ) -> Result<OracleVerdict, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(OracleError::Unavailable("connection refused".to_string()))
    }
}

/// Oracle that blocks every call until released by the test.
pub struct GatedOracle {
    pub entered: Notify,
    pub release: Notify,
    pub calls: AtomicUsize,
    answer: Result<OracleVerdict, OracleError>,
}

impl GatedOracle {
    pub fn new(verdict: OracleVerdict) -> Self {
        Self::answering(Ok(verdict))
    }

    /// Gated oracle whose released calls fail with `error`.
    pub fn failing(error: OracleError) -> Self {
        Self::answering(Err(error))
    }

    fn answering(answer: Result<OracleVerdict, OracleError>) -> Self {
        Self {
            entered: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
            answer,
        }
    }
}

#[async_trait]
impl DecisionOracle for GatedOracle {
    async fn evaluate(
        &self,
        _handler_name: &str,
        _scenario: &str,
    ) -> Result<OracleVerdict, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        self.answer.clone()
    }
}

/// Oracle whose calls never resolve.
pub struct StalledOracle;

#[async_trait]
impl DecisionOracle for StalledOracle {
    async fn evaluate(
        &self,
        _handler_name: &str,
        _scenario: &str,
    ) -> Result<OracleVerdict, OracleError> {
        std::future::pending().await
    }
}

// ============================================================================
// SECTION: Clock and Observer
// ============================================================================

/// Clock returning 1000, 1001, 1002, ...
pub struct StepClock {
    next: AtomicI64,
}

impl StepClock {
    pub const fn new() -> Self {
        Self {
            next: AtomicI64::new(1_000),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

/// Observer recording a compact label per event.
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub const fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl RunObserver for RecordingObserver {
    fn on_event(&self, event: &RunEvent<'_>) {
        let label = match event {
            RunEvent::RunStarted { .. } => "run_started".to_string(),
            RunEvent::StageStarted { stage, .. } => format!("stage_started:{}", stage.identifier),
            RunEvent::OracleFallback { stage, .. } => format!("fallback:{}", stage.identifier),
            RunEvent::OutcomeRecorded { outcome, .. } => {
                format!("recorded:{}:{}", outcome.handler, outcome.decision)
            }
            RunEvent::RunFinished { status, .. } => format!("finished:{}", status.as_str()),
            RunEvent::StaleDiscarded { stage, .. } => format!("stale:{}", stage.identifier),
            RunEvent::Reset { .. } => "reset".to_string(),
        };
        self.events.lock().unwrap().push(label);
    }
}

// ============================================================================
// SECTION: Runner Builders
// ============================================================================

/// Headless runner over the built-in catalog with a stepping clock.
pub fn headless_runner(oracle: Arc<dyn DecisionOracle>) -> PipelineRunner {
    PipelineRunner::new(StageCatalog::builtin(), oracle, RunnerConfig::headless())
        .with_clock(Arc::new(StepClock::new()))
}
