// crates/handler-chain-cli/src/render.rs
// ============================================================================
// Module: Console Renderer
// Description: Run observer that prints pipeline progress as text lines.
// Purpose: Show each stage's processing state and verdict as it resolves.
// Dependencies: handler-chain-core, time
// ============================================================================

//! ## Overview
//! [`ConsoleRenderer`] turns [`RunEvent`]s into localized text lines: a
//! banner, a "processing" line per stage, the verdict with its log code and
//! wall-clock time, and the final `PIPELINE_*` status line. Write failures are
//! ignored because observers cannot fail a run.
//!
//! Oracle failures and discarded late results are not rendered. A fallback
//! shows up only as its FAIL outcome line, so the operator never sees transport
//! error text; the audit sink keeps the detail.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;
use std::sync::PoisonError;

use handler_chain_core::RunEvent;
use handler_chain_core::RunObserver;
use handler_chain_core::RunStatus;
use handler_chain_core::Timestamp;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::i18n::Locale;
use crate::t_in;

// ============================================================================
// SECTION: Formatting
// ============================================================================

/// Wall-clock format for outcome lines.
const CLOCK_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

/// Formats a timestamp as a UTC `HH:MM:SS` clock reading.
#[must_use]
pub fn format_clock_time(timestamp: Timestamp) -> String {
    let nanos = i128::from(timestamp.as_unix_millis()).saturating_mul(1_000_000);
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|moment| moment.format(CLOCK_FORMAT).ok())
        .unwrap_or_else(|| "--:--:--".to_string())
}

// ============================================================================
// SECTION: Renderer
// ============================================================================

/// Observer that renders run progress to a text writer.
///
/// # Invariants
/// - Lines are written in event order; each event writes at most one line.
pub struct ConsoleRenderer {
    /// Output language.
    locale: Locale,
    /// Number of stages in the catalog.
    total: usize,
    /// Output sink.
    writer: Mutex<Box<dyn Write + Send>>,
    /// Display name of the stage most recently started.
    current_stage: Mutex<Option<String>>,
}

impl ConsoleRenderer {
    /// Builds a renderer over an arbitrary writer.
    #[must_use]
    pub fn new(locale: Locale, total: usize, writer: Box<dyn Write + Send>) -> Self {
        Self {
            locale,
            total,
            writer: Mutex::new(writer),
            current_stage: Mutex::new(None),
        }
    }

    /// Builds a renderer writing to stdout.
    #[must_use]
    pub fn stdout(locale: Locale, total: usize) -> Self {
        Self::new(locale, total, Box::new(std::io::stdout()))
    }

    /// Writes one line, ignoring I/O failures.
    fn line(&self, message: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(writer, "{message}");
        let _ = writer.flush();
    }

    /// Renders the terminal status line.
    fn status_line(&self, status: RunStatus) -> Option<String> {
        match status {
            RunStatus::Completed => Some(t_in!(self.locale, "run.status.ok", total = self.total)),
            RunStatus::ShortCircuited => {
                let stage = self
                    .current_stage
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clone()
                    .unwrap_or_default();
                Some(t_in!(self.locale, "run.status.blocked", stage = stage))
            }
            RunStatus::Idle | RunStatus::Running => None,
        }
    }
}

impl RunObserver for ConsoleRenderer {
    fn on_event(&self, event: &RunEvent<'_>) {
        let locale = self.locale;
        let message = match event {
            RunEvent::RunStarted {
                scenario, ..
            } => Some(t_in!(locale, "run.banner", scenario = scenario)),
            RunEvent::StageStarted {
                index,
                stage,
                ..
            } => {
                *self.current_stage.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(stage.display_name.clone());
                Some(t_in!(
                    locale,
                    "run.stage.processing",
                    position = index + 1,
                    total = self.total,
                    stage = stage.display_name
                ))
            }
            RunEvent::OutcomeRecorded {
                outcome, ..
            } => Some(t_in!(
                locale,
                "run.stage.outcome",
                time = format_clock_time(outcome.observed_at),
                decision = outcome.decision,
                code = outcome.code,
                reason = outcome.reason
            )),
            RunEvent::RunFinished {
                status, ..
            } => self.status_line(*status),
            RunEvent::Reset {
                ..
            } => Some(t_in!(locale, "run.reset")),
            RunEvent::OracleFallback {
                ..
            }
            | RunEvent::StaleDiscarded {
                ..
            } => None,
        };
        if let Some(message) = message {
            self.line(&message);
        }
    }
}
