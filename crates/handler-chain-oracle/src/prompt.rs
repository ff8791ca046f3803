// crates/handler-chain-oracle/src/prompt.rs
// ============================================================================
// Module: Oracle Prompts
// Description: Prompt text sent to the generative model for each stage.
// Purpose: Keep prompt wording and language selection in one place.
// ============================================================================

//! ## Overview
//! The prompt frames the model as one handler in a security chain and asks
//! for a single JSON object with `decision`, `reason`, and `logs` fields. The
//! language controls the language of the `reason` the model writes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Prompt Language
// ============================================================================

/// Language requested for model-written reasons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromptLanguage {
    /// English prompt and reasons.
    #[default]
    #[serde(rename = "en")]
    English,
    /// Vietnamese prompt and reasons.
    #[serde(rename = "vi")]
    Vietnamese,
}

impl PromptLanguage {
    /// Returns the short language tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Vietnamese => "vi",
        }
    }
}

impl fmt::Display for PromptLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PromptLanguage {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "vi" | "vietnamese" => Ok(Self::Vietnamese),
            other => Err(format!("unsupported prompt language: {other}")),
        }
    }
}

// ============================================================================
// SECTION: Prompt Builder
// ============================================================================

/// Builds the per-stage prompt for the model.
#[must_use]
pub fn build_prompt(language: PromptLanguage, handler_name: &str, scenario: &str) -> String {
    match language {
        PromptLanguage::English => format!(
            "You are acting as one logic handler in a security Handler Chain.\n\
             Current handler: {handler_name}.\n\
             Incoming request: {scenario}.\n\
             Decide whether this handler lets the request through.\n\
             Reply with exactly one JSON object of the form:\n\
             {{ \"decision\": \"PASS\" | \"FAIL\", \
             \"reason\": \"a short English explanation of why the request passes or is blocked\", \
             \"logs\": \"a simulated technical log code such as ERR_AUTH_401 or OK_200\" }}"
        ),
        PromptLanguage::Vietnamese => format!(
            "Bạn đóng vai một logic handler trong một Handler Chain bảo mật.\n\
             Handler hiện tại: {handler_name}.\n\
             Request đầu vào: {scenario}.\n\
             Hãy quyết định handler này có cho request đi tiếp hay không.\n\
             Trả về đúng một đối tượng JSON dạng:\n\
             {{ \"decision\": \"PASS\" | \"FAIL\", \
             \"reason\": \"giải thích ngắn gọn bằng tiếng Việt vì sao request được cho qua hoặc bị chặn\", \
             \"logs\": \"mã log kỹ thuật giả lập, ví dụ ERR_AUTH_401 hoặc OK_200\" }}"
        ),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
