// crates/handler-chain-core/src/core/scenario.rs
// ============================================================================
// Module: Request Scenarios
// Description: Operator-selected descriptions of simulated inbound requests.
// Purpose: Carry the scenario text through a run and expose built-in presets.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`Scenario`] is opaque text handed verbatim to the decision oracle. The
//! presets mirror the attack catalog offered by the simulator selector; any
//! other non-blank text is also accepted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum scenario length in bytes.
pub const MAX_SCENARIO_BYTES: usize = 512;

// ============================================================================
// SECTION: Scenario
// ============================================================================

/// Scenario construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScenarioError {
    /// Scenario text is empty or whitespace.
    #[error("scenario must not be blank")]
    Blank,
    /// Scenario text exceeds [`MAX_SCENARIO_BYTES`].
    #[error("scenario exceeds {limit} bytes: {actual}")]
    TooLong {
        /// Actual length in bytes.
        actual: usize,
        /// Maximum allowed length in bytes.
        limit: usize,
    },
    /// Preset name is not recognized.
    #[error("unknown scenario preset: {0}")]
    UnknownPreset(String),
}

/// Simulated inbound request description.
///
/// # Invariants
/// - Non-blank and at most [`MAX_SCENARIO_BYTES`] bytes.
/// - Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Scenario(String);

impl Scenario {
    /// Creates a scenario from operator text.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] when the text is blank or too long.
    pub fn new(text: impl Into<String>) -> Result<Self, ScenarioError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ScenarioError::Blank);
        }
        if text.len() > MAX_SCENARIO_BYTES {
            return Err(ScenarioError::TooLong {
                actual: text.len(),
                limit: MAX_SCENARIO_BYTES,
            });
        }
        Ok(Self(text))
    }

    /// Returns the scenario text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Presets
// ============================================================================

/// Built-in scenario presets offered to operators.
///
/// # Invariants
/// - Slugs and request texts are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioPreset {
    /// Benign request expected to pass every stage.
    #[default]
    SafeRequest,
    /// Expired credentials expected to fail authentication.
    ExpiredJwt,
    /// Traffic burst expected to fail rate limiting.
    DdosBurst,
    /// Broken payload expected to fail validation.
    MalformedSchema,
    /// Injection payload expected to fail the firewall.
    SqlInjection,
}

impl ScenarioPreset {
    /// All presets in selector order.
    pub const ALL: [Self; 5] = [
        Self::SafeRequest,
        Self::ExpiredJwt,
        Self::DdosBurst,
        Self::MalformedSchema,
        Self::SqlInjection,
    ];

    /// Returns the stable slug for the preset.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::SafeRequest => "safe-request",
            Self::ExpiredJwt => "expired-jwt",
            Self::DdosBurst => "ddos-burst",
            Self::MalformedSchema => "malformed-schema",
            Self::SqlInjection => "sql-injection",
        }
    }

    /// Returns the operator-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SafeRequest => "Safe: Standard Request",
            Self::ExpiredJwt => "Fail: Expired JWT Token",
            Self::DdosBurst => "Fail: DDoS Traffic Burst",
            Self::MalformedSchema => "Fail: Malformed Schema",
            Self::SqlInjection => "Fail: SQL Injection Pattern",
        }
    }

    /// Returns the request text sent to the oracle.
    #[must_use]
    pub const fn request_text(self) -> &'static str {
        match self {
            Self::SafeRequest => "Standard GET Request",
            Self::ExpiredJwt => "Expired JWT Token Auth Attempt",
            Self::DdosBurst => "DDoS Burst - 50k requests/sec",
            Self::MalformedSchema => "Malformed JSON with Missing Schema",
            Self::SqlInjection => "SQL Injection Attempt 'OR 1=1' --",
        }
    }

    /// Returns the built-in stage identifier expected to block this preset.
    #[must_use]
    pub const fn expected_block(self) -> Option<&'static str> {
        match self {
            Self::SafeRequest => None,
            Self::ExpiredJwt => Some("auth"),
            Self::DdosBurst => Some("ratelimit"),
            Self::MalformedSchema => Some("validation"),
            Self::SqlInjection => Some("firewall"),
        }
    }

    /// Builds the scenario for this preset.
    #[must_use]
    pub fn scenario(self) -> Scenario {
        Scenario(self.request_text().to_string())
    }

    /// Parses a preset slug.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownPreset`] when the slug is not recognized.
    pub fn parse(slug: &str) -> Result<Self, ScenarioError> {
        let normalized = slug.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.slug() == normalized)
            .ok_or_else(|| ScenarioError::UnknownPreset(slug.to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn blank_scenario_is_rejected() {
        assert_eq!(Scenario::new("   "), Err(ScenarioError::Blank));
    }

    #[test]
    fn oversized_scenario_is_rejected() {
        let text = "x".repeat(MAX_SCENARIO_BYTES + 1);
        assert!(matches!(Scenario::new(text), Err(ScenarioError::TooLong { .. })));
    }

    #[test]
    fn presets_parse_by_slug_case_insensitively() {
        for preset in ScenarioPreset::ALL {
            assert_eq!(ScenarioPreset::parse(&preset.slug().to_uppercase()).unwrap(), preset);
            assert_eq!(preset.scenario().as_str(), preset.request_text());
        }
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert_eq!(
            ScenarioPreset::parse("xss"),
            Err(ScenarioError::UnknownPreset("xss".to_string()))
        );
    }
}
