// crates/handler-chain-core/src/core/mod.rs
// ============================================================================
// Module: Handler Chain Data Model
// Description: Stage catalog, scenarios, outcomes, and run state.
// Purpose: Group the serializable records shared by runner, oracles, and CLI.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The data model is deliberately small: an immutable stage catalog, an opaque
//! scenario string, append-only stage outcomes, and the run state snapshot
//! exposed to renderers.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod identifiers;
pub mod outcome;
pub mod scenario;
pub mod stage;
pub mod state;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::StageId;
pub use outcome::Decision;
pub use outcome::StageOutcome;
pub use scenario::Scenario;
pub use scenario::ScenarioError;
pub use scenario::ScenarioPreset;
pub use stage::CatalogError;
pub use stage::HandlerStage;
pub use stage::StageCatalog;
pub use state::RunOutcome;
pub use state::RunReport;
pub use state::RunState;
pub use state::RunStatus;
pub use time::Timestamp;
