// crates/handler-chain-config/src/lib.rs
// ============================================================================
// Module: Handler Chain Config
// Description: Configuration model and loader for the handler chain simulator.
// Purpose: Expose a single validated configuration surface to the CLI.
// Dependencies: handler-chain-core, handler-chain-oracle, serde, toml
// ============================================================================

//! ## Overview
//! Loads `handler-chain.toml` with strict path, size, and encoding guards and
//! validates every section before any run starts. Converts validated sections
//! into the runtime types consumed by the runner and oracles.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AuditConfig;
pub use config::AuditSinkKind;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::DEFAULT_API_KEY_ENV;
pub use config::HandlerChainConfig;
pub use config::OracleConfig;
pub use config::OracleKind;
pub use config::RunnerSection;
pub use config::StageConfig;
