// crates/handler-chain-oracle/src/gemini.rs
// ============================================================================
// Module: Gemini Oracle
// Description: Decision oracle backed by the Gemini generateContent API.
// Purpose: Ask a hosted model for a PASS/FAIL verdict per handler stage.
// Dependencies: handler-chain-core, reqwest, serde, serde_json
// ============================================================================

//! ## Overview
//! [`GeminiOracle`] posts one `generateContent` request per stage, asking for a
//! JSON response constrained by a response schema. The first candidate's text
//! parts are concatenated and parsed into an
//! [`OracleVerdict`](handler_chain_core::OracleVerdict).
//!
//! Security posture: model output is untrusted. Response bodies are read
//! under a byte limit, redirects are refused, plain HTTP is rejected unless
//! explicitly allowed, and the API key is never echoed back.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use handler_chain_core::Decision;
use handler_chain_core::DecisionOracle;
use handler_chain_core::OracleError;
use handler_chain_core::OracleVerdict;
use reqwest::Client;
use reqwest::Url;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::prompt::PromptLanguage;
use crate::prompt::build_prompt;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Default Gemini API endpoint.
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
/// Default model identifier.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
/// Default maximum response body size in bytes.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 256 * 1024;
/// Maximum characters of an error body echoed into error messages.
const MAX_ERROR_PREVIEW_CHARS: usize = 200;
/// Maximum model identifier length.
const MAX_MODEL_LENGTH: usize = 128;
/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Secret API key for the Gemini service.
///
/// # Invariants
/// - `Debug` output never includes the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps raw key material.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw key material for request headers.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Configuration for [`GeminiOracle`].
#[derive(Clone)]
pub struct GeminiOracleConfig {
    /// Base endpoint URL, without the `/v1beta` path.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// API key sent in the `x-goog-api-key` header.
    pub api_key: ApiKey,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response body size in bytes.
    pub max_response_bytes: usize,
    /// Allow cleartext `http` endpoints.
    pub allow_http: bool,
    /// Language requested for model reasons.
    pub language: PromptLanguage,
}

impl GeminiOracleConfig {
    /// Builds a configuration with default endpoint, model, and limits.
    #[must_use]
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_key,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            allow_http: false,
            language: PromptLanguage::default(),
        }
    }
}

impl fmt::Debug for GeminiOracleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiOracleConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("timeout_ms", &self.timeout_ms)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("allow_http", &self.allow_http)
            .field("language", &self.language)
            .finish()
    }
}

/// Errors raised while constructing a [`GeminiOracle`].
///
/// # Invariants
/// - Messages never include the API key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeminiConfigError {
    /// Endpoint is not a valid absolute URL.
    #[error("invalid gemini endpoint: {0}")]
    InvalidEndpoint(String),
    /// Endpoint uses cleartext HTTP without opt-in.
    #[error("gemini endpoint must use https unless allow_http is set")]
    InsecureEndpoint,
    /// Model identifier is empty or contains unsupported characters.
    #[error("invalid gemini model identifier: {0}")]
    InvalidModel(String),
    /// API key is empty.
    #[error("gemini api key is empty")]
    MissingApiKey,
    /// Timeout or size limit is zero.
    #[error("gemini {0} must be greater than zero")]
    ZeroLimit(&'static str),
    /// HTTP client could not be built.
    #[error("gemini http client error: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Oracle
// ============================================================================

/// Decision oracle backed by the Gemini `generateContent` API.
///
/// # Invariants
/// - The HTTP client is built once and reused for every stage.
/// - Every failure maps to [`OracleError::Unavailable`] or
///   [`OracleError::MalformedResponse`].
pub struct GeminiOracle {
    /// Shared HTTP client.
    client: Client,
    /// Fully-resolved `generateContent` URL.
    url: Url,
    /// API key header value.
    api_key: ApiKey,
    /// Maximum response body size in bytes.
    max_response_bytes: usize,
    /// Prompt language.
    language: PromptLanguage,
}

impl GeminiOracle {
    /// Builds an oracle from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiConfigError`] when the endpoint, model, key, or limits
    /// are invalid, or the HTTP client cannot be constructed.
    pub fn new(config: GeminiOracleConfig) -> Result<Self, GeminiConfigError> {
        if config.api_key.expose().trim().is_empty() {
            return Err(GeminiConfigError::MissingApiKey);
        }
        if config.timeout_ms == 0 {
            return Err(GeminiConfigError::ZeroLimit("timeout_ms"));
        }
        if config.max_response_bytes == 0 {
            return Err(GeminiConfigError::ZeroLimit("max_response_bytes"));
        }
        validate_model(&config.model)?;
        let url = generate_content_url(&config.endpoint, &config.model, config.allow_http)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(Policy::none())
            .build()
            .map_err(|err| GeminiConfigError::Client(err.to_string()))?;
        Ok(Self {
            client,
            url,
            api_key: config.api_key,
            max_response_bytes: config.max_response_bytes,
            language: config.language,
        })
    }

    /// Returns the resolved `generateContent` URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Builds the request body for one stage.
    #[must_use]
    pub fn request_body(&self, handler_name: &str, scenario: &str) -> Value {
        let prompt = build_prompt(self.language, handler_name, scenario);
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "decision": { "type": "STRING", "enum": ["PASS", "FAIL"] },
                        "reason": { "type": "STRING" },
                        "logs": { "type": "STRING" }
                    },
                    "required": ["decision", "reason", "logs"],
                    "propertyOrdering": ["decision", "reason", "logs"]
                }
            }
        })
    }
}

impl fmt::Debug for GeminiOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiOracle")
            .field("url", &self.url.as_str())
            .field("api_key", &self.api_key)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DecisionOracle for GeminiOracle {
    async fn evaluate(
        &self,
        handler_name: &str,
        scenario: &str,
    ) -> Result<OracleVerdict, OracleError> {
        let body = self.request_body(handler_name, scenario);
        let response = self
            .client
            .post(self.url.clone())
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|err| OracleError::Unavailable(transport_message(err)))?;
        let status = response.status();
        let bytes = read_response_body_with_limit(response, self.max_response_bytes).await?;
        if !status.is_success() {
            let preview = String::from_utf8_lossy(&bytes);
            return Err(OracleError::Unavailable(format!(
                "http status {}: {}",
                status.as_u16(),
                truncate_preview(preview.trim())
            )));
        }
        let text = candidate_text(&bytes)?;
        parse_verdict_text(&text)
    }
}

// ============================================================================
// SECTION: Response Parsing
// ============================================================================

/// Top-level `generateContent` response.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    /// Generated candidates.
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// One generated candidate.
#[derive(Debug, Deserialize)]
struct Candidate {
    /// Candidate content, absent when generation was blocked.
    content: Option<CandidateContent>,
}

/// Candidate content parts.
#[derive(Debug, Deserialize)]
struct CandidateContent {
    /// Content parts.
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

/// One content part.
#[derive(Debug, Deserialize)]
struct CandidatePart {
    /// Text payload, absent for non-text parts.
    text: Option<String>,
}

/// Verdict object produced by the model.
#[derive(Debug, Deserialize)]
struct VerdictPayload {
    /// `PASS` or `FAIL`.
    decision: String,
    /// Explanation text.
    reason: String,
    /// Simulated log code.
    #[serde(alias = "code")]
    logs: String,
}

/// Extracts the concatenated text of the first candidate.
fn candidate_text(bytes: &[u8]) -> Result<String, OracleError> {
    let response: GenerateContentResponse = serde_json::from_slice(bytes).map_err(|err| {
        OracleError::MalformedResponse(format!("invalid generateContent response: {err}"))
    })?;
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| OracleError::MalformedResponse("response has no candidates".to_string()))?;
    let text: String = candidate
        .content
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(OracleError::MalformedResponse("candidate has no text".to_string()));
    }
    Ok(text)
}

/// Parses model text into a validated verdict.
///
/// Accepts the verdict object with a `logs` or `code` field. The decision
/// must be exactly `PASS` or `FAIL` after trimming.
///
/// # Errors
///
/// Returns [`OracleError::MalformedResponse`] when the text is not a verdict
/// object, the decision is unknown, or the reason or code is blank.
pub fn parse_verdict_text(text: &str) -> Result<OracleVerdict, OracleError> {
    let payload: VerdictPayload = serde_json::from_str(text.trim())
        .map_err(|err| OracleError::MalformedResponse(format!("invalid verdict json: {err}")))?;
    let decision = Decision::parse(&payload.decision).ok_or_else(|| {
        OracleError::MalformedResponse(format!(
            "unknown decision: {}",
            truncate_preview(&payload.decision)
        ))
    })?;
    let verdict = OracleVerdict::new(decision, payload.reason, payload.logs);
    verdict.validate()?;
    Ok(verdict)
}

// ============================================================================
// SECTION: Transport Helpers
// ============================================================================

/// Validates the model identifier used in the URL path.
fn validate_model(model: &str) -> Result<(), GeminiConfigError> {
    let valid = !model.is_empty()
        && model.len() <= MAX_MODEL_LENGTH
        && model.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_'));
    if valid { Ok(()) } else { Err(GeminiConfigError::InvalidModel(model.to_string())) }
}

/// Resolves the `generateContent` URL for the endpoint and model.
fn generate_content_url(
    endpoint: &str,
    model: &str,
    allow_http: bool,
) -> Result<Url, GeminiConfigError> {
    let base = Url::parse(endpoint.trim())
        .map_err(|err| GeminiConfigError::InvalidEndpoint(err.to_string()))?;
    match base.scheme() {
        "https" => {}
        "http" if allow_http => {}
        "http" => return Err(GeminiConfigError::InsecureEndpoint),
        other => {
            return Err(GeminiConfigError::InvalidEndpoint(format!("unsupported scheme: {other}")));
        }
    }
    if base.host_str().is_none() {
        return Err(GeminiConfigError::InvalidEndpoint("endpoint has no host".to_string()));
    }
    let joined = format!(
        "{}/v1beta/models/{model}:generateContent",
        base.as_str().trim_end_matches('/')
    );
    Url::parse(&joined).map_err(|err| GeminiConfigError::InvalidEndpoint(err.to_string()))
}

/// Reads a response body while enforcing a byte limit.
async fn read_response_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, OracleError> {
    let mut body = Vec::new();
    while let Some(chunk) =
        response.chunk().await.map_err(|err| OracleError::Unavailable(transport_message(err)))?
    {
        let next_total = body.len().saturating_add(chunk.len());
        if next_total > limit {
            return Err(OracleError::Unavailable(format!(
                "response exceeds size limit ({next_total} > {limit} bytes)"
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Describes a transport failure without the request URL.
fn transport_message(err: reqwest::Error) -> String {
    let kind = if err.is_timeout() {
        "request timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_redirect() {
        "redirect refused"
    } else {
        "request failed"
    };
    format!("{kind}: {}", err.without_url())
}

/// Truncates untrusted text for inclusion in error messages.
fn truncate_preview(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_PREVIEW_CHARS {
        return text.to_string();
    }
    let mut preview: String = text.chars().take(MAX_ERROR_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

// ============================================================================
// SECTION: Tests
// ============================================================================
