// crates/handler-chain-core/src/lib.rs
// ============================================================================
// Module: Handler Chain Core
// Description: Data model, interfaces, and the sequential pipeline runner.
// Purpose: Drive an ordered handler catalog through a decision oracle.
// Dependencies: async-trait, serde, thiserror, time, tokio
// ============================================================================

//! ## Overview
//! Handler Chain simulates a chain-of-responsibility request pipeline. Each
//! handler stage is judged by an external [`DecisionOracle`]; the
//! [`PipelineRunner`] walks the catalog in declared order, records one
//! [`StageOutcome`] per stage, and short-circuits on the first failure.
//!
//! Invariants:
//! - Stages are evaluated strictly in catalog order, never concurrently.
//! - Oracle failures are absorbed into a fallback FAIL outcome.
//! - Continuations belonging to a reset run never mutate the live state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::CatalogError;
pub use crate::core::Decision;
pub use crate::core::HandlerStage;
pub use crate::core::RunOutcome;
pub use crate::core::RunReport;
pub use crate::core::RunState;
pub use crate::core::RunStatus;
pub use crate::core::Scenario;
pub use crate::core::ScenarioError;
pub use crate::core::ScenarioPreset;
pub use crate::core::StageCatalog;
pub use crate::core::StageId;
pub use crate::core::StageOutcome;
pub use crate::core::Timestamp;
pub use crate::interfaces::Clock;
pub use crate::interfaces::DecisionOracle;
pub use crate::interfaces::OracleError;
pub use crate::interfaces::OracleVerdict;
pub use crate::interfaces::RunEvent;
pub use crate::interfaces::RunObserver;
pub use crate::runtime::DEFAULT_FALLBACK_REASON;
pub use crate::runtime::DEFAULT_STAGE_DELAY;
pub use crate::runtime::FALLBACK_CODE;
pub use crate::runtime::PipelineRunner;
pub use crate::runtime::RunnerConfig;
pub use crate::runtime::RunnerError;
pub use crate::runtime::SystemClock;
