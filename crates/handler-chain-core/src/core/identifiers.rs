// crates/handler-chain-core/src/core/identifiers.rs
// ============================================================================
// Module: Handler Chain Identifiers
// Description: Opaque identifiers for handler stages.
// Purpose: Provide a strongly typed, serializable stage identifier.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Stage identifiers are short machine labels (`auth`, `firewall`) that stay
//! stable across runs. Display names are kept separately on
//! [`HandlerStage`](crate::core::HandlerStage).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Identifier for a handler stage in the catalog.
///
/// # Invariants
/// - Opaque UTF-8 string; uniqueness is enforced by
///   [`StageCatalog`](crate::core::StageCatalog), not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(String);

impl StageId {
    /// Creates a new stage identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for StageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl PartialEq<&str> for StageId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
