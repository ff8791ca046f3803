// crates/handler-chain-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing and CLI entry-point helpers.
// Purpose: Ensure flags, locale resolution, and exit statuses stay stable.
// Dependencies: handler-chain-cli main helpers
// ============================================================================

//! ## Overview
//! Validates clap wiring, locale precedence, scenario resolution, listing
//! output, and the mapping from run outcomes to exit statuses.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use clap::CommandFactory;
use clap::Parser;
use handler_chain_config::HandlerChainConfig;
use handler_chain_config::OracleKind;
use handler_chain_core::DecisionOracle;
use handler_chain_core::OracleError;
use handler_chain_core::OracleVerdict;
use handler_chain_core::PipelineRunner;
use handler_chain_core::RunOutcome;
use handler_chain_core::RunnerConfig;
use handler_chain_core::ScenarioPreset;
use handler_chain_core::StageCatalog;
use handler_chain_oracle::PromptLanguage;
use handler_chain_oracle::ScriptedOracle;

use super::Cli;
use super::Commands;
use super::ConfigCommand;
use super::LangArg;
use super::Locale;
use super::OracleArg;
use super::OutputFormat;
use super::build_oracle;
use super::drive;
use super::drive_until;
use super::exit_status_for;
use super::resolve_locale;
use super::resolve_scenario;
use super::scenario_lines;
use super::stage_lines;

// ============================================================================
// SECTION: Argument Parsing
// ============================================================================

#[test]
fn clap_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn run_parses_preset_oracle_and_format() {
    let cli = Cli::try_parse_from([
        "handler-chain",
        "--lang",
        "vi",
        "run",
        "--preset",
        "SQL-Injection",
        "--oracle",
        "scripted",
        "--delay-ms",
        "0",
        "--format",
        "json",
    ])
    .unwrap();
    assert_eq!(cli.lang, Some(LangArg::Vi));
    let Some(Commands::Run(run)) = cli.command else {
        panic!("expected run command");
    };
    assert_eq!(run.preset, Some(ScenarioPreset::SqlInjection));
    assert_eq!(run.oracle, Some(OracleArg::Scripted));
    assert_eq!(run.delay_ms, Some(0));
    assert_eq!(run.format, OutputFormat::Json);
}

#[test]
fn run_rejects_scenario_with_preset() {
    let result = Cli::try_parse_from([
        "handler-chain",
        "run",
        "--scenario",
        "custom",
        "--preset",
        "safe-request",
    ]);
    assert!(result.is_err());
}

#[test]
fn run_rejects_unknown_preset_and_excessive_delay() {
    assert!(Cli::try_parse_from(["handler-chain", "run", "--preset", "nope"]).is_err());
    assert!(Cli::try_parse_from(["handler-chain", "run", "--delay-ms", "60001"]).is_err());
}

#[test]
fn config_validate_accepts_path() {
    let cli = Cli::try_parse_from(["handler-chain", "config", "validate", "--config", "a.toml"])
        .unwrap();
    let Some(Commands::Config {
        command: ConfigCommand::Validate(args),
    }) = cli.command
    else {
        panic!("expected config validate");
    };
    assert_eq!(args.config.unwrap().to_string_lossy(), "a.toml");
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

#[test]
fn flag_locale_overrides_environment() {
    assert_eq!(resolve_locale(Some(LangArg::En), Some("vi")).unwrap(), Locale::En);
    assert_eq!(resolve_locale(None, Some("vi_VN")).unwrap(), Locale::Vi);
    assert_eq!(resolve_locale(None, None).unwrap(), Locale::En);
}

#[test]
fn invalid_environment_locale_is_rejected() {
    let err = resolve_locale(None, Some("klingon")).unwrap_err();
    assert!(err.to_string().contains("HANDLER_CHAIN_LANG"));
}

#[test]
fn exit_statuses_distinguish_outcomes() {
    assert_eq!(exit_status_for(RunOutcome::Completed), 0);
    assert_eq!(exit_status_for(RunOutcome::ShortCircuited), 2);
    assert_eq!(exit_status_for(RunOutcome::Cancelled), 130);
}

#[test]
fn scenario_defaults_to_safe_request() {
    let scenario = resolve_scenario(None, None).unwrap();
    assert_eq!(scenario.as_str(), ScenarioPreset::SafeRequest.request_text());
    let custom = resolve_scenario(Some("Header smuggling"), Some(ScenarioPreset::DdosBurst)).unwrap();
    assert_eq!(custom.as_str(), "Header smuggling");
    assert!(resolve_scenario(Some("   "), None).is_err());
}

#[test]
fn listings_cover_catalog_and_presets() {
    let stages = stage_lines(&StageCatalog::builtin());
    assert_eq!(stages.len(), 5);
    assert!(stages[1].contains("auth"));
    assert!(stages[4].contains("WAF Firewall"));

    let presets = scenario_lines();
    assert_eq!(presets.len(), ScenarioPreset::ALL.len() + 1);
    assert!(presets.iter().any(|line| line.contains("sql-injection") && line.contains("firewall")));
}

#[test]
fn gemini_oracle_requires_api_key_variable() {
    let mut config = HandlerChainConfig::default();
    config.oracle.kind = OracleKind::Gemini;
    config.oracle.api_key_env = "HANDLER_CHAIN_CLI_TEST_KEY_NEVER_SET".to_string();
    let err = build_oracle(&config, Locale::En).err().unwrap();
    assert!(err.to_string().contains("HANDLER_CHAIN_CLI_TEST_KEY_NEVER_SET"));
}

#[tokio::test]
async fn scripted_oracle_follows_cli_locale() {
    let mut config = HandlerChainConfig::default();
    config.oracle.kind = OracleKind::Scripted;
    let oracle = build_oracle(&config, Locale::Vi).unwrap();
    let verdict = oracle.evaluate("WAF Firewall", "SQL Injection Attempt 'OR 1=1' --").await.unwrap();
    assert_eq!(verdict.code, "ERR_WAF_403");
    assert_eq!(verdict.reason, "Payload khớp với chữ ký tấn công đã biết.");

    config.oracle.language = Some(PromptLanguage::English);
    let oracle = build_oracle(&config, Locale::Vi).unwrap();
    let verdict = oracle.evaluate("WAF Firewall", "SQL Injection Attempt 'OR 1=1' --").await.unwrap();
    assert_eq!(verdict.reason, "The payload matches a known attack signature.");
}

// ============================================================================
// SECTION: Run Driver
// ============================================================================

#[tokio::test]
async fn drive_runs_scripted_sql_injection_to_short_circuit() {
    let runner = PipelineRunner::new(
        StageCatalog::builtin(),
        Arc::new(ScriptedOracle::builtin()),
        RunnerConfig::headless(),
    );
    let report = drive(&runner, &ScenarioPreset::SqlInjection.scenario()).await.unwrap();
    assert_eq!(report.outcome, RunOutcome::ShortCircuited);
    assert_eq!(report.outcomes.len(), 4);
    assert_eq!(report.outcomes[3].code, "ERR_WAF_403");
}

/// Oracle whose calls never resolve.
struct StalledOracle;

#[async_trait]
impl DecisionOracle for StalledOracle {
    async fn evaluate(
        &self,
        _handler_name: &str,
        _scenario: &str,
    ) -> Result<OracleVerdict, OracleError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn interrupt_cancels_without_waiting_for_oracle() {
    let runner = PipelineRunner::new(
        StageCatalog::builtin(),
        Arc::new(StalledOracle),
        RunnerConfig::headless(),
    );
    let interrupt = tokio::time::sleep(Duration::from_millis(20));
    let report = tokio::time::timeout(
        Duration::from_secs(5),
        drive_until(&runner, &ScenarioPreset::SafeRequest.scenario(), interrupt),
    )
    .await
    .expect("interrupted run should return promptly")
    .unwrap();
    assert_eq!(report.outcome, RunOutcome::Cancelled);
    assert!(report.outcomes.is_empty());
    assert!(!runner.is_running());
    assert_eq!(exit_status_for(report.outcome), 130);
}
