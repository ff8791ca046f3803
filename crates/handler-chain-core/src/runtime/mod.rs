// crates/handler-chain-core/src/runtime/mod.rs
// ============================================================================
// Module: Handler Chain Runtime
// Description: Pipeline runner and default clock.
// Purpose: Execute the stage catalog against a scenario with short-circuiting.
// Dependencies: crate::core, crate::interfaces, time, tokio
// ============================================================================

//! ## Overview
//! The runtime hosts [`PipelineRunner`], the only component with sequencing
//! logic, and [`SystemClock`], the wall-clock timestamp source used outside
//! tests.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Wall-clock implementation of the clock interface.
pub mod clock;
pub mod runner;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use clock::SystemClock;
pub use runner::DEFAULT_FALLBACK_REASON;
pub use runner::DEFAULT_STAGE_DELAY;
pub use runner::FALLBACK_CODE;
pub use runner::PipelineRunner;
pub use runner::RunnerConfig;
pub use runner::RunnerError;
