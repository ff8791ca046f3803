// crates/handler-chain-config/src/config.rs
// ============================================================================
// Module: Handler Chain Configuration
// Description: Configuration loading and validation for the simulator.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: handler-chain-core, handler-chain-oracle, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every field has a default, so an absent file section yields the built-in
//! behavior. Secrets are never read from the file: the oracle API key comes
//! from the environment variable named by `oracle.api_key_env`.
//! Security posture: config inputs are untrusted and validated before use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use handler_chain_core::DEFAULT_STAGE_DELAY;
use handler_chain_core::HandlerStage;
use handler_chain_core::RunnerConfig;
use handler_chain_core::StageCatalog;
use handler_chain_oracle::ApiKey;
use handler_chain_oracle::DEFAULT_GEMINI_ENDPOINT;
use handler_chain_oracle::DEFAULT_GEMINI_MODEL;
use handler_chain_oracle::DEFAULT_MAX_RESPONSE_BYTES;
use handler_chain_oracle::DEFAULT_TIMEOUT_MS;
use handler_chain_oracle::GeminiOracleConfig;
use handler_chain_oracle::PromptLanguage;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "handler-chain.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "HANDLER_CHAIN_CONFIG";
/// Default environment variable holding the oracle API key.
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum delay between stages in milliseconds.
const MAX_STAGE_DELAY_MS: u64 = 60_000;
/// Minimum oracle timeout in milliseconds.
const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum oracle timeout in milliseconds.
const MAX_TIMEOUT_MS: u64 = 120_000;
/// Minimum oracle response limit in bytes.
const MIN_RESPONSE_BYTES: usize = 1024;
/// Maximum oracle response limit in bytes.
const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;
/// Maximum fallback reason length in bytes.
const MAX_FALLBACK_REASON_BYTES: usize = 512;
/// Maximum environment variable name length.
const MAX_ENV_NAME_LENGTH: usize = 128;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level simulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerChainConfig {
    /// Runner pacing and fallback settings.
    #[serde(default)]
    pub runner: RunnerSection,
    /// Decision oracle settings.
    #[serde(default)]
    pub oracle: OracleConfig,
    /// Custom stage catalog; empty selects the built-in catalog.
    #[serde(default)]
    pub stages: Vec<StageConfig>,
    /// Audit sink settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl HandlerChainConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path, then `HANDLER_CHAIN_CONFIG`, then
    /// `handler-chain.toml` in the working directory. A missing default file
    /// yields the default configuration; a missing explicit file is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.runner.validate()?;
        self.oracle.validate()?;
        self.catalog()?;
        self.audit.validate()?;
        Ok(())
    }

    /// Builds the stage catalog, using the built-in catalog when none is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configured stages are invalid.
    pub fn catalog(&self) -> Result<StageCatalog, ConfigError> {
        if self.stages.is_empty() {
            return Ok(StageCatalog::builtin());
        }
        let stages = self
            .stages
            .iter()
            .map(|stage| HandlerStage::new(&stage.id, &stage.name, &stage.description))
            .collect();
        StageCatalog::new(stages).map_err(|err| ConfigError::Invalid(format!("stages: {err}")))
    }
}

/// Runner pacing and fallback settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerSection {
    /// Delay after each passing stage that has a successor.
    #[serde(default = "default_stage_delay_ms")]
    pub stage_delay_ms: u64,
    /// Optional upper bound on each oracle call.
    #[serde(default)]
    pub oracle_timeout_ms: Option<u64>,
    /// Fallback reason override; the localized default is used when unset.
    #[serde(default)]
    pub fallback_reason: Option<String>,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            stage_delay_ms: default_stage_delay_ms(),
            oracle_timeout_ms: None,
            fallback_reason: None,
        }
    }
}

impl RunnerSection {
    /// Validates runner settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.stage_delay_ms > MAX_STAGE_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "runner.stage_delay_ms must be at most {MAX_STAGE_DELAY_MS}"
            )));
        }
        if let Some(timeout) = self.oracle_timeout_ms {
            validate_timeout("runner.oracle_timeout_ms", timeout)?;
        }
        if let Some(reason) = &self.fallback_reason {
            if reason.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "runner.fallback_reason must be non-empty".to_string(),
                ));
            }
            if reason.len() > MAX_FALLBACK_REASON_BYTES {
                return Err(ConfigError::Invalid(
                    "runner.fallback_reason exceeds max length".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Builds the runner configuration, using `default_reason` when no
    /// fallback reason is configured.
    #[must_use]
    pub fn runner_config(&self, default_reason: &str) -> RunnerConfig {
        RunnerConfig {
            stage_delay: Duration::from_millis(self.stage_delay_ms),
            oracle_timeout: self.oracle_timeout_ms.map(Duration::from_millis),
            fallback_reason: self
                .fallback_reason
                .clone()
                .unwrap_or_else(|| default_reason.to_string()),
        }
    }
}

/// Oracle implementation selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleKind {
    /// Remote Gemini model.
    #[default]
    Gemini,
    /// Offline keyword rules.
    Scripted,
}

/// Decision oracle settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Oracle implementation.
    #[serde(default)]
    pub kind: OracleKind,
    /// Gemini API base endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Gemini model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum response body size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Allow cleartext `http` endpoints.
    #[serde(default)]
    pub allow_http: bool,
    /// Prompt language; the CLI locale is used when unset.
    #[serde(default)]
    pub language: Option<PromptLanguage>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            kind: OracleKind::default(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
            allow_http: false,
            language: None,
        }
    }
}

impl OracleConfig {
    /// Validates oracle settings.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout("oracle.timeout_ms", self.timeout_ms)?;
        if !(MIN_RESPONSE_BYTES..=MAX_RESPONSE_BYTES).contains(&self.max_response_bytes) {
            return Err(ConfigError::Invalid(format!(
                "oracle.max_response_bytes must be between {MIN_RESPONSE_BYTES} and \
                 {MAX_RESPONSE_BYTES}"
            )));
        }
        validate_endpoint(&self.endpoint, self.allow_http)?;
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("oracle.model must be non-empty".to_string()));
        }
        let env_valid = !self.api_key_env.is_empty()
            && self.api_key_env.len() <= MAX_ENV_NAME_LENGTH
            && self.api_key_env.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
        if !env_valid {
            return Err(ConfigError::Invalid(
                "oracle.api_key_env must be a non-empty environment variable name".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads the API key from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the variable is unset or blank.
    pub fn resolve_api_key(&self) -> Result<ApiKey, ConfigError> {
        match env::var(&self.api_key_env) {
            Ok(value) if !value.trim().is_empty() => Ok(ApiKey::new(value.trim())),
            _ => Err(ConfigError::Invalid(format!(
                "environment variable {} must hold the oracle api key",
                self.api_key_env
            ))),
        }
    }

    /// Builds the Gemini oracle configuration.
    #[must_use]
    pub fn gemini_config(
        &self,
        api_key: ApiKey,
        fallback_language: PromptLanguage,
    ) -> GeminiOracleConfig {
        GeminiOracleConfig {
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            api_key,
            timeout_ms: self.timeout_ms,
            max_response_bytes: self.max_response_bytes,
            allow_http: self.allow_http,
            language: self.language.unwrap_or(fallback_language),
        }
    }
}

/// One configured handler stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Stable stage identifier.
    pub id: String,
    /// Display name sent to the oracle.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

/// Audit sink selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Audit events are discarded.
    #[default]
    None,
    /// Audit events are written to stderr as JSON lines.
    Stderr,
    /// Audit events are appended to a file as JSON lines.
    File,
}

/// Audit sink settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Output path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.path is required for the file sink".to_string()))
            }
            (_, Some(_)) => Err(ConfigError::Invalid(
                "audit.path is only valid for the file sink".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path and reports whether it was explicitly requested.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a timeout against the supported range.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if (MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
        )))
    }
}

/// Validates the oracle endpoint scheme and host.
fn validate_endpoint(endpoint: &str, allow_http: bool) -> Result<(), ConfigError> {
    let trimmed = endpoint.trim();
    let rest = if let Some(rest) = trimmed.strip_prefix("https://") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        if !allow_http {
            return Err(ConfigError::Invalid(
                "oracle.endpoint must use https unless oracle.allow_http is set".to_string(),
            ));
        }
        rest
    } else {
        return Err(ConfigError::Invalid("oracle.endpoint must be an http(s) url".to_string()));
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(ConfigError::Invalid("oracle.endpoint must include a host".to_string()));
    }
    Ok(())
}

/// Default stage delay in milliseconds.
fn default_stage_delay_ms() -> u64 {
    u64::try_from(DEFAULT_STAGE_DELAY.as_millis()).unwrap_or(MAX_STAGE_DELAY_MS)
}

/// Default Gemini endpoint.
fn default_endpoint() -> String {
    DEFAULT_GEMINI_ENDPOINT.to_string()
}

/// Default Gemini model.
fn default_model() -> String {
    DEFAULT_GEMINI_MODEL.to_string()
}

/// Default API key environment variable.
fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

/// Default oracle timeout.
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Default oracle response limit.
const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test assertions use unwrap for clarity.")]

    use super::*;

    #[test]
    fn default_config_is_valid_and_uses_builtin_catalog() {
        let config = HandlerChainConfig::default();
        config.validate().unwrap();
        assert_eq!(config.catalog().unwrap(), StageCatalog::builtin());
        assert_eq!(config.runner.stage_delay_ms, 800);
    }

    #[test]
    fn endpoint_requires_host() {
        assert!(validate_endpoint("https://", false).is_err());
        assert!(validate_endpoint("https://example.test/path", false).is_ok());
        assert!(validate_endpoint("ftp://example.test", true).is_err());
    }

    #[test]
    fn runner_config_prefers_configured_reason() {
        let section = RunnerSection {
            stage_delay_ms: 0,
            oracle_timeout_ms: Some(500),
            fallback_reason: Some("custom".to_string()),
        };
        let runner = section.runner_config("default");
        assert_eq!(runner.fallback_reason, "custom");
        assert_eq!(runner.oracle_timeout, Some(Duration::from_millis(500)));
        assert_eq!(RunnerSection::default().runner_config("default").fallback_reason, "default");
    }

    #[test]
    fn gemini_config_falls_back_to_locale_language() {
        let oracle = OracleConfig::default();
        let gemini = oracle.gemini_config(ApiKey::new("k"), PromptLanguage::Vietnamese);
        assert_eq!(gemini.language, PromptLanguage::Vietnamese);
        assert_eq!(gemini.model, DEFAULT_GEMINI_MODEL);
    }
}
