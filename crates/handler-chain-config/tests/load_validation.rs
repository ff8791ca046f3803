//! Config load and validation tests for handler-chain-config.
// crates/handler-chain-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards and section validation.
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

#![allow(
    clippy::use_debug,
    reason = "Failure messages include debug renderings of configs."
)]

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use handler_chain_config::AuditSinkKind;
use handler_chain_config::ConfigError;
use handler_chain_config::HandlerChainConfig;
use handler_chain_config::OracleKind;
use handler_chain_core::StageCatalog;
use tempfile::NamedTempFile;

/// Result type for tests that report failures as messages.
type TestResult = Result<(), String>;

/// Asserts that loading failed with a message containing `needle`.
fn assert_invalid(result: Result<HandlerChainConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

/// Writes TOML content to a temporary file.
fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

// ============================================================================
// SECTION: Load Guards
// ============================================================================

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(
        HandlerChainConfig::load(Some(Path::new(&long_path))),
        "config path exceeds max length",
    )
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        HandlerChainConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_missing_explicit_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    assert_invalid(HandlerChainConfig::load(Some(&path)), "config io error")
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&vec![b'#'; 1_048_577]).map_err(|err| err.to_string())?;
    assert_invalid(HandlerChainConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(HandlerChainConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_malformed_toml() -> TestResult {
    let file = write_config("[runner\nstage_delay_ms = 1")?;
    assert_invalid(HandlerChainConfig::load(Some(file.path())), "config parse error")
}

// ============================================================================
// SECTION: Accepted Configs
// ============================================================================

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let file = write_config("")?;
    let config = HandlerChainConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config != HandlerChainConfig::default() {
        return Err(format!("unexpected config: {config:?}"));
    }
    Ok(())
}

#[test]
fn full_config_round_trips_into_runtime_types() -> TestResult {
    let file = write_config(
        r#"
[runner]
stage_delay_ms = 0
oracle_timeout_ms = 2500
fallback_reason = "Oracle offline."

[oracle]
kind = "scripted"
endpoint = "http://127.0.0.1:8080"
allow_http = true
model = "gemini-2.5-flash"
api_key_env = "GEMINI_KEY"
timeout_ms = 5000
max_response_bytes = 4096
language = "vi"

[[stages]]
id = "geo"
name = "Geo Fence"
description = "Blocks unsupported regions."

[[stages]]
id = "auth"
name = "Authentication"

[audit]
sink = "file"
path = "logs/audit.jsonl"
"#,
    )?;
    let config = HandlerChainConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.oracle.kind != OracleKind::Scripted || config.audit.sink != AuditSinkKind::File {
        return Err(format!("unexpected selectors: {config:?}"));
    }
    let catalog = config.catalog().map_err(|err| err.to_string())?;
    let names: Vec<&str> = catalog.iter().map(|stage| stage.display_name.as_str()).collect();
    if names != ["Geo Fence", "Authentication"] {
        return Err(format!("unexpected stage order: {names:?}"));
    }
    let runner = config.runner.runner_config("unused");
    if runner.stage_delay != Duration::ZERO
        || runner.oracle_timeout != Some(Duration::from_millis(2500))
        || runner.fallback_reason != "Oracle offline."
    {
        return Err(format!("unexpected runner config: {runner:?}"));
    }
    Ok(())
}

#[test]
fn absent_stages_select_builtin_catalog() -> TestResult {
    let config = HandlerChainConfig::from_toml("[runner]\nstage_delay_ms = 100\n")
        .map_err(|err| err.to_string())?;
    let catalog = config.catalog().map_err(|err| err.to_string())?;
    if catalog != StageCatalog::builtin() {
        return Err("expected builtin catalog".to_string());
    }
    Ok(())
}

// ============================================================================
// SECTION: Section Validation
// ============================================================================

#[test]
fn rejects_excessive_stage_delay() -> TestResult {
    assert_invalid(
        HandlerChainConfig::from_toml("[runner]\nstage_delay_ms = 60001\n"),
        "runner.stage_delay_ms",
    )
}

#[test]
fn rejects_out_of_range_timeouts() -> TestResult {
    assert_invalid(
        HandlerChainConfig::from_toml("[runner]\noracle_timeout_ms = 50\n"),
        "runner.oracle_timeout_ms",
    )?;
    assert_invalid(
        HandlerChainConfig::from_toml("[oracle]\ntimeout_ms = 120001\n"),
        "oracle.timeout_ms",
    )
}

#[test]
fn rejects_blank_fallback_reason() -> TestResult {
    assert_invalid(
        HandlerChainConfig::from_toml("[runner]\nfallback_reason = \"  \"\n"),
        "runner.fallback_reason must be non-empty",
    )
}

#[test]
fn rejects_response_limit_out_of_range() -> TestResult {
    assert_invalid(
        HandlerChainConfig::from_toml("[oracle]\nmax_response_bytes = 512\n"),
        "oracle.max_response_bytes",
    )?;
    assert_invalid(
        HandlerChainConfig::from_toml("[oracle]\nmax_response_bytes = 8388609\n"),
        "oracle.max_response_bytes",
    )
}

#[test]
fn rejects_cleartext_endpoint_without_opt_in() -> TestResult {
    assert_invalid(
        HandlerChainConfig::from_toml("[oracle]\nendpoint = \"http://127.0.0.1:8080\"\n"),
        "must use https",
    )
}

#[test]
fn rejects_invalid_api_key_env_name() -> TestResult {
    assert_invalid(
        HandlerChainConfig::from_toml("[oracle]\napi_key_env = \"API KEY\"\n"),
        "oracle.api_key_env",
    )
}

#[test]
fn rejects_duplicate_stage_identifiers() -> TestResult {
    assert_invalid(
        HandlerChainConfig::from_toml(
            "[[stages]]\nid = \"auth\"\nname = \"A\"\n\n[[stages]]\nid = \"auth\"\nname = \"B\"\n",
        ),
        "stages:",
    )
}

#[test]
fn rejects_blank_stage_name() -> TestResult {
    assert_invalid(
        HandlerChainConfig::from_toml("[[stages]]\nid = \"auth\"\nname = \" \"\n"),
        "stages:",
    )
}

#[test]
fn rejects_too_many_stages() -> TestResult {
    let stages: String = (0..33)
        .map(|index| format!("[[stages]]\nid = \"s{index}\"\nname = \"Stage {index}\"\n\n"))
        .collect();
    assert_invalid(HandlerChainConfig::from_toml(&stages), "stages:")
}

#[test]
fn file_sink_requires_path() -> TestResult {
    assert_invalid(
        HandlerChainConfig::from_toml("[audit]\nsink = \"file\"\n"),
        "audit.path is required",
    )?;
    assert_invalid(
        HandlerChainConfig::from_toml("[audit]\nsink = \"stderr\"\npath = \"audit.jsonl\"\n"),
        "only valid for the file sink",
    )
}

#[test]
fn rejects_unknown_oracle_kind() -> TestResult {
    assert_invalid(
        HandlerChainConfig::from_toml("[oracle]\nkind = \"oracle9000\"\n"),
        "config parse error",
    )
}

// ============================================================================
// SECTION: Secrets
// ============================================================================

#[test]
fn api_key_comes_only_from_environment() -> TestResult {
    let config = HandlerChainConfig::from_toml(
        "[oracle]\napi_key_env = \"HANDLER_CHAIN_TEST_KEY_THAT_IS_NEVER_SET\"\n",
    )
    .map_err(|err| err.to_string())?;
    match config.oracle.resolve_api_key() {
        Err(error) if error.to_string().contains("HANDLER_CHAIN_TEST_KEY_THAT_IS_NEVER_SET") => {
            Ok(())
        }
        other => Err(format!("unexpected api key resolution: {other:?}")),
    }
}
