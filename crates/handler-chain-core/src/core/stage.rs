// crates/handler-chain-core/src/core/stage.rs
// ============================================================================
// Module: Handler Stage Catalog
// Description: Static, ordered catalog of handler stages.
// Purpose: Define the defense layers a simulated request passes through.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`StageCatalog`] is the ordered list of handler stages evaluated by the
//! runner. Order models layered precedence: earlier stages shield later ones.
//! Catalogs are validated once at construction and immutable afterwards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::StageId;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum number of stages allowed in a catalog.
pub const MAX_CATALOG_STAGES: usize = 32;

// ============================================================================
// SECTION: Stage
// ============================================================================

/// One handler stage in the chain.
///
/// # Invariants
/// - Fixed at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerStage {
    /// Stable stage identifier.
    pub identifier: StageId,
    /// Human-readable name passed to the decision oracle.
    pub display_name: String,
    /// Short description of the defense provided by the stage.
    pub description: String,
}

impl HandlerStage {
    /// Creates a new handler stage.
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            identifier: StageId::new(identifier),
            display_name: display_name.into(),
            description: description.into(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Catalog validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Catalog contains no stages.
    #[error("stage catalog must contain at least one stage")]
    Empty,
    /// Catalog exceeds [`MAX_CATALOG_STAGES`].
    #[error("stage catalog exceeds the stage limit: {0} stages")]
    TooManyStages(usize),
    /// A stage has a blank identifier or display name.
    #[error("stage at index {0} has a blank identifier or display name")]
    BlankField(usize),
    /// Two stages share an identifier.
    #[error("duplicate stage identifier: {0}")]
    DuplicateIdentifier(StageId),
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Ordered, validated catalog of handler stages.
///
/// # Invariants
/// - Non-empty, at most [`MAX_CATALOG_STAGES`] stages.
/// - Identifiers are unique; identifiers and display names are non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StageCatalog {
    /// Stages in evaluation order.
    stages: Vec<HandlerStage>,
}

impl StageCatalog {
    /// Builds a catalog from stages in evaluation order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog is empty, too large, has blank
    /// fields, or repeats an identifier.
    pub fn new(stages: Vec<HandlerStage>) -> Result<Self, CatalogError> {
        if stages.is_empty() {
            return Err(CatalogError::Empty);
        }
        if stages.len() > MAX_CATALOG_STAGES {
            return Err(CatalogError::TooManyStages(stages.len()));
        }
        let mut seen = BTreeSet::new();
        for (index, stage) in stages.iter().enumerate() {
            if stage.identifier.as_str().trim().is_empty() || stage.display_name.trim().is_empty()
            {
                return Err(CatalogError::BlankField(index));
            }
            if !seen.insert(stage.identifier.as_str()) {
                return Err(CatalogError::DuplicateIdentifier(stage.identifier.clone()));
            }
        }
        Ok(Self {
            stages,
        })
    }

    /// Returns the built-in four-layer catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            stages: vec![
                HandlerStage::new("auth", "Authentication", "Identity & JWT Security"),
                HandlerStage::new("ratelimit", "Rate Limiter", "DDoS & Traffic Control"),
                HandlerStage::new("validation", "Payload Validator", "Data Schema Integrity"),
                HandlerStage::new("firewall", "WAF Firewall", "Malicious Script Filtering"),
            ],
        }
    }

    /// Returns the stages in evaluation order.
    #[must_use]
    pub fn stages(&self) -> &[HandlerStage] {
        &self.stages
    }

    /// Iterates stages in evaluation order.
    pub fn iter(&self) -> std::slice::Iter<'_, HandlerStage> {
        self.stages.iter()
    }

    /// Returns the stage at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HandlerStage> {
        self.stages.get(index)
    }

    /// Returns the number of stages.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false for a validated catalog; provided for API symmetry.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl<'a> IntoIterator for &'a StageCatalog {
    type Item = &'a HandlerStage;
    type IntoIter = std::slice::Iter<'a, HandlerStage>;

    fn into_iter(self) -> Self::IntoIter {
        self.stages.iter()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
