// crates/handler-chain-cli/tests/render.rs
// ============================================================================
// Module: Console Renderer Tests
// Description: Renders scripted runs into an in-memory buffer.
// Purpose: Ensure stage lines, verdicts, and status lines appear in order.
// Dependencies: handler-chain-cli render module, handler-chain-core, handler-chain-oracle
// ============================================================================

//! ## Overview
//! Drives a [`PipelineRunner`] over the scripted oracle with a
//! [`ConsoleRenderer`] attached and checks the rendered transcript in both
//! supported locales.

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

use std::io;
use std::io::Write;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use handler_chain_cli::i18n::Locale;
use handler_chain_cli::render::ConsoleRenderer;
use handler_chain_cli::render::format_clock_time;
use handler_chain_core::Clock;
use handler_chain_core::DecisionOracle;
use handler_chain_core::OracleError;
use handler_chain_core::OracleVerdict;
use handler_chain_core::PipelineRunner;
use handler_chain_core::RunEvent;
use handler_chain_core::RunObserver;
use handler_chain_core::RunnerConfig;
use handler_chain_core::ScenarioPreset;
use handler_chain_core::StageCatalog;
use handler_chain_core::Timestamp;
use handler_chain_oracle::ScriptedOracle;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Writer appending into a shared buffer.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Returns the buffered text split into lines.
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Clock pinned to 01:02:03 UTC on the epoch day.
struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(3_723_000)
    }
}

/// Transport error text returned by [`OfflineOracle`].
const OFFLINE_ERROR: &str =
    "connection failed: error sending request: tcp connect error: Connection refused (os error 111)";

/// Oracle that is always unreachable.
struct OfflineOracle;

#[async_trait]
impl DecisionOracle for OfflineOracle {
    async fn evaluate(
        &self,
        _handler_name: &str,
        _scenario: &str,
    ) -> Result<OracleVerdict, OracleError> {
        Err(OracleError::Unavailable(OFFLINE_ERROR.to_string()))
    }
}

/// Runs `preset` through the built-in catalog and returns the transcript.
async fn transcript(
    locale: Locale,
    oracle: Arc<dyn DecisionOracle>,
    preset: ScenarioPreset,
    fallback_reason: &str,
) -> Vec<String> {
    let buffer = SharedBuffer::default();
    let catalog = StageCatalog::builtin();
    let renderer = ConsoleRenderer::new(locale, catalog.len(), Box::new(buffer.clone()));
    let config = RunnerConfig {
        fallback_reason: fallback_reason.to_string(),
        ..RunnerConfig::headless()
    };
    let runner = PipelineRunner::new(catalog, oracle, config)
        .with_clock(Arc::new(FixedClock))
        .with_observer(Arc::new(renderer));
    runner.start(&preset.scenario()).await.unwrap();
    buffer.lines()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn clock_time_formats_utc() {
    assert_eq!(format_clock_time(Timestamp::from_unix_millis(3_723_000)), "01:02:03");
    assert_eq!(format_clock_time(Timestamp::from_unix_millis(0)), "00:00:00");
}

#[tokio::test]
async fn completed_run_renders_every_stage_and_ok_status() {
    let lines = transcript(
        Locale::En,
        Arc::new(ScriptedOracle::builtin()),
        ScenarioPreset::SafeRequest,
        "unused",
    )
    .await;
    assert_eq!(lines.len(), 1 + 4 * 2 + 1, "{lines:#?}");
    assert_eq!(lines[0], "Incoming request: Standard GET Request");
    assert_eq!(lines[1], "[1/4] Authentication: processing...");
    assert!(lines[2].starts_with("    01:02:03 PASS [OK_200]"));
    assert_eq!(lines[7], "[4/4] WAF Firewall: processing...");
    assert_eq!(lines[9], "PIPELINE_RESOLVED_OK: the request passed all 4 handlers.");
}

#[tokio::test]
async fn short_circuit_names_blocking_stage() {
    let lines = transcript(
        Locale::En,
        Arc::new(ScriptedOracle::builtin()),
        ScenarioPreset::DdosBurst,
        "unused",
    )
    .await;
    assert!(lines.iter().any(|line| line.contains("FAIL [ERR_RATE_429]")));
    assert!(!lines.iter().any(|line| line.contains("Payload Validator")));
    assert_eq!(
        lines.last().unwrap(),
        "PIPELINE_SHORT_CIRCUITED: the request was blocked at Rate Limiter."
    );
}

#[tokio::test]
async fn fallback_renders_as_plain_rejection_in_vietnamese() {
    let lines = transcript(
        Locale::Vi,
        Arc::new(OfflineOracle),
        ScenarioPreset::SafeRequest,
        "Lỗi kết nối AI Engine. Vui lòng thử lại sau.",
    )
    .await;
    assert_eq!(lines.len(), 4, "{lines:#?}");
    assert_eq!(lines[1], "[1/4] Authentication: đang xử lý...");
    assert_eq!(
        lines[2],
        "    01:02:03 FAIL [SYSTEM_ERR_AI] Lỗi kết nối AI Engine. Vui lòng thử lại sau."
    );
    assert_eq!(lines[3], "PIPELINE_SHORT_CIRCUITED: request bị chặn tại Authentication.");
}

#[tokio::test]
async fn oracle_error_text_never_reaches_console() {
    let lines = transcript(
        Locale::En,
        Arc::new(OfflineOracle),
        ScenarioPreset::SqlInjection,
        "AI engine connection error. Please try again later.",
    )
    .await;
    assert!(!lines.iter().any(|line| line.contains(OFFLINE_ERROR)), "{lines:#?}");
    assert!(!lines.iter().any(|line| line.contains("os error")), "{lines:#?}");
    assert!(lines[2].contains("FAIL [SYSTEM_ERR_AI] AI engine connection error."));
}

#[test]
fn discarded_late_result_is_not_rendered() {
    let buffer = SharedBuffer::default();
    let catalog = StageCatalog::builtin();
    let renderer = ConsoleRenderer::new(Locale::En, catalog.len(), Box::new(buffer.clone()));
    let stage = catalog.get(0).unwrap();
    renderer.on_event(&RunEvent::StaleDiscarded {
        generation: 3,
        stage,
    });
    renderer.on_event(&RunEvent::OracleFallback {
        generation: 3,
        stage,
        error: &OracleError::Unavailable(OFFLINE_ERROR.to_string()),
    });
    assert!(buffer.lines().is_empty());
}
