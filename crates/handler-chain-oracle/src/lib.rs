// crates/handler-chain-oracle/src/lib.rs
// ============================================================================
// Module: Handler Chain Oracles
// Description: Decision oracle implementations for the handler pipeline.
// Purpose: Provide a remote language-model oracle and a deterministic offline oracle.
// Dependencies: handler-chain-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! Implementations of [`handler_chain_core::DecisionOracle`]:
//! - [`GeminiOracle`] asks a hosted generative model for a JSON verdict.
//! - [`ScriptedOracle`] answers from keyword rules without network access.
//!
//! Security posture: model responses are untrusted; bodies are size-limited,
//! parsing fails closed, and API keys never appear in debug output or errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod gemini;
pub mod prompt;
pub mod scripted;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use gemini::ApiKey;
pub use gemini::DEFAULT_GEMINI_ENDPOINT;
pub use gemini::DEFAULT_GEMINI_MODEL;
pub use gemini::DEFAULT_MAX_RESPONSE_BYTES;
pub use gemini::DEFAULT_TIMEOUT_MS;
pub use gemini::GeminiConfigError;
pub use gemini::GeminiOracle;
pub use gemini::GeminiOracleConfig;
pub use gemini::parse_verdict_text;
pub use prompt::PromptLanguage;
pub use prompt::build_prompt;
pub use scripted::PASS_CODE;
pub use scripted::ScriptRule;
pub use scripted::ScriptedOracle;
