// crates/handler-chain-oracle/src/scripted.rs
// ============================================================================
// Module: Scripted Oracle
// Description: Deterministic keyword-rule oracle for offline runs.
// Purpose: Produce plausible verdicts for the built-in stages without a network.
// Dependencies: handler-chain-core
// ============================================================================

//! ## Overview
//! [`ScriptedOracle`] matches the scenario text against per-handler keyword
//! rules. The first matching rule for the handler yields a FAIL verdict with
//! the rule's code and reason; otherwise the handler passes with `OK_200`.
//! Matching is case-insensitive on both handler names and keywords. Built-in
//! reasons are written in the oracle's [`PromptLanguage`], matching what the
//! remote model is asked to produce.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use handler_chain_core::Decision;
use handler_chain_core::DecisionOracle;
use handler_chain_core::OracleError;
use handler_chain_core::OracleVerdict;

use crate::prompt::PromptLanguage;

// ============================================================================
// SECTION: Rules
// ============================================================================

/// Code reported when no rule blocks the request.
pub const PASS_CODE: &str = "OK_200";

/// Keyword rule that blocks a request at one handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRule {
    /// Handler display name the rule applies to.
    pub handler: String,
    /// Lowercase keywords; any match blocks the request.
    pub keywords: Vec<String>,
    /// Log code reported on a block.
    pub code: String,
    /// Reason reported on a block.
    pub reason: String,
}

impl ScriptRule {
    /// Builds a rule, normalizing keywords to lowercase.
    #[must_use]
    pub fn new(
        handler: impl Into<String>,
        keywords: &[&str],
        code: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            handler: handler.into(),
            keywords: keywords.iter().map(|keyword| keyword.to_lowercase()).collect(),
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// Returns true when the rule applies to the handler and scenario.
    fn matches(&self, handler_name: &str, scenario_lower: &str) -> bool {
        self.handler.eq_ignore_ascii_case(handler_name)
            && self.keywords.iter().any(|keyword| scenario_lower.contains(keyword.as_str()))
    }
}

// ============================================================================
// SECTION: Oracle
// ============================================================================

/// Offline oracle answering from keyword rules.
///
/// # Invariants
/// - Verdicts are a pure function of the handler name and scenario text.
/// - Every verdict has a non-blank reason and code.
#[derive(Debug, Clone)]
pub struct ScriptedOracle {
    /// Ordered rules; the first match wins.
    rules: Vec<ScriptRule>,
    /// Language of generated PASS reasons.
    language: PromptLanguage,
}

/// Built-in rule table: handler, keywords, code, English and Vietnamese reasons.
const BUILTIN_RULES: [(&str, &[&str], &str, &str, &str); 4] = [
    (
        "Authentication",
        &["expired", "invalid token", "forged", "unauthenticated", "missing credentials"],
        "ERR_AUTH_401",
        "The token is expired or invalid, so the caller's identity cannot be verified.",
        "Token đã hết hạn hoặc không hợp lệ, không thể xác minh danh tính người gọi.",
    ),
    (
        "Rate Limiter",
        &["ddos", "burst", "requests/sec", "flood"],
        "ERR_RATE_429",
        "Request volume exceeds the allowed rate for this client.",
        "Lưu lượng request vượt quá giới hạn cho phép của client này.",
    ),
    (
        "Payload Validator",
        &["malformed", "missing schema", "invalid json", "schema violation"],
        "ERR_SCHEMA_422",
        "The payload does not conform to the expected schema.",
        "Payload không tuân thủ schema mong đợi.",
    ),
    (
        "WAF Firewall",
        &["sql injection", "or 1=1", "union select", "<script", "xss", "path traversal"],
        "ERR_WAF_403",
        "The payload matches a known attack signature.",
        "Payload khớp với chữ ký tấn công đã biết.",
    ),
];

impl ScriptedOracle {
    /// Builds an oracle from explicit rules with English PASS reasons.
    #[must_use]
    pub const fn new(rules: Vec<ScriptRule>) -> Self {
        Self {
            rules,
            language: PromptLanguage::English,
        }
    }

    /// Builds the English oracle covering the built-in stage catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self::builtin_in(PromptLanguage::English)
    }

    /// Builds the built-in oracle with reasons in `language`.
    #[must_use]
    pub fn builtin_in(language: PromptLanguage) -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(handler, keywords, code, english, vietnamese)| {
                let reason = match language {
                    PromptLanguage::English => english,
                    PromptLanguage::Vietnamese => vietnamese,
                };
                ScriptRule::new(*handler, keywords, *code, *reason)
            })
            .collect();
        Self {
            rules,
            language,
        }
    }

    /// Returns the configured rules.
    #[must_use]
    pub fn rules(&self) -> &[ScriptRule] {
        &self.rules
    }

    /// Computes the verdict for one handler and scenario.
    #[must_use]
    pub fn verdict_for(&self, handler_name: &str, scenario: &str) -> OracleVerdict {
        let scenario_lower = scenario.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(handler_name, &scenario_lower))
            .map_or_else(
                || OracleVerdict::new(Decision::Pass, self.pass_reason(handler_name), PASS_CODE),
                |rule| OracleVerdict::new(Decision::Fail, rule.reason.clone(), rule.code.clone()),
            )
    }
}

impl ScriptedOracle {
    /// Reason attached to PASS verdicts.
    fn pass_reason(&self, handler_name: &str) -> String {
        match self.language {
            PromptLanguage::English => {
                format!("{handler_name} found nothing suspicious in the request.")
            }
            PromptLanguage::Vietnamese => {
                format!("{handler_name} không phát hiện dấu hiệu bất thường trong request.")
            }
        }
    }
}

impl Default for ScriptedOracle {
    fn default() -> Self {
        Self::builtin()
    }
}

#[async_trait]
impl DecisionOracle for ScriptedOracle {
    async fn evaluate(
        &self,
        handler_name: &str,
        scenario: &str,
    ) -> Result<OracleVerdict, OracleError> {
        Ok(self.verdict_for(handler_name, scenario))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
