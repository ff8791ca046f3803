// crates/handler-chain-cli/src/lib.rs
// ============================================================================
// Module: Handler Chain CLI Library
// Description: Shared CLI modules for localization, rendering, and auditing.
// Purpose: Expose CLI building blocks to the binary and integration tests.
// Dependencies: handler-chain-core, serde_json, time
// ============================================================================

//! ## Overview
//! Library half of the `handler-chain` binary. The binary wires these pieces
//! around a [`handler_chain_core::PipelineRunner`]:
//! - [`i18n`]: message catalog and the [`t!`](crate::t) macro.
//! - [`render`]: console observer that prints stages as they resolve.
//! - [`audit`]: JSON-lines audit observer and sinks.

pub mod audit;
pub mod i18n;
pub mod render;
