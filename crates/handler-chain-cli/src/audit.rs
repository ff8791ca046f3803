// crates/handler-chain-cli/src/audit.rs
// ============================================================================
// Module: Run Audit Logging
// Description: Structured audit events for pipeline runs.
// Purpose: Emit JSON-lines audit records without hard logging dependencies.
// Dependencies: handler-chain-config, handler-chain-core, serde, serde_json
// ============================================================================

//! ## Overview
//! [`AuditObserver`] converts each [`RunEvent`] into a [`RunAuditEvent`] and
//! hands it to a [`RunAuditSink`]. Sinks write one JSON object per line to
//! stderr or an append-only file, or discard events. Records carry stage
//! identifiers, decisions, codes, and oracle error text; API keys never reach
//! the runner, so they cannot appear here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use handler_chain_config::AuditConfig;
use handler_chain_config::AuditSinkKind;
use handler_chain_core::Clock;
use handler_chain_core::Decision;
use handler_chain_core::RunEvent;
use handler_chain_core::RunObserver;
use handler_chain_core::RunStatus;
use handler_chain_core::SystemClock;
use handler_chain_core::Timestamp;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Run audit event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: i64,
    /// Run generation the event belongs to.
    pub generation: u64,
    /// Scenario text for run starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    /// Stage identifier when the event concerns one stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    /// Recorded decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    /// Recorded log code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Terminal status for finished runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    /// Oracle error text for fallbacks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunAuditEvent {
    /// Builds an empty record for the given event kind.
    const fn base(event: &'static str, timestamp: Timestamp, generation: u64) -> Self {
        Self {
            event,
            timestamp_ms: timestamp.as_unix_millis(),
            generation,
            scenario: None,
            stage: None,
            decision: None,
            code: None,
            status: None,
            error: None,
        }
    }

    /// Converts a runner event into an audit record.
    #[must_use]
    pub fn from_event(event: &RunEvent<'_>, timestamp: Timestamp) -> Self {
        match event {
            RunEvent::RunStarted {
                generation,
                scenario,
            } => Self {
                scenario: Some(scenario.as_str().to_string()),
                ..Self::base("run_started", timestamp, *generation)
            },
            RunEvent::StageStarted {
                generation,
                stage,
                ..
            } => Self {
                stage: Some(stage.identifier.as_str().to_string()),
                ..Self::base("stage_started", timestamp, *generation)
            },
            RunEvent::OracleFallback {
                generation,
                stage,
                error,
            } => Self {
                stage: Some(stage.identifier.as_str().to_string()),
                error: Some(error.to_string()),
                ..Self::base("oracle_fallback", timestamp, *generation)
            },
            RunEvent::OutcomeRecorded {
                generation,
                outcome,
                ..
            } => Self {
                stage: Some(outcome.handler.as_str().to_string()),
                decision: Some(outcome.decision),
                code: Some(outcome.code.clone()),
                ..Self::base("outcome_recorded", timestamp, *generation)
            },
            RunEvent::RunFinished {
                generation,
                status,
            } => Self {
                status: Some(*status),
                ..Self::base("run_finished", timestamp, *generation)
            },
            RunEvent::StaleDiscarded {
                generation,
                stage,
            } => Self {
                stage: Some(stage.identifier.as_str().to_string()),
                ..Self::base("stale_discarded", timestamp, *generation)
            },
            RunEvent::Reset {
                generation,
            } => Self::base("reset", timestamp, *generation),
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for run events.
pub trait RunAuditSink: Send + Sync {
    /// Record an audit event.
    fn record(&self, event: &RunAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl RunAuditSink for StderrAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl RunAuditSink for FileAuditSink {
    fn record(&self, event: &RunAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl RunAuditSink for NoopAuditSink {
    fn record(&self, _event: &RunAuditEvent) {}
}

/// Builds the sink selected by configuration.
///
/// # Errors
///
/// Returns an error if the file sink cannot open its path.
pub fn sink_from_config(config: &AuditConfig) -> io::Result<Arc<dyn RunAuditSink>> {
    match (config.sink, config.path.as_deref()) {
        (AuditSinkKind::File, Some(path)) => Ok(Arc::new(FileAuditSink::new(Path::new(path))?)),
        (AuditSinkKind::File, None) => {
            Err(io::Error::new(io::ErrorKind::InvalidInput, "audit.path is required"))
        }
        (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
        (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
    }
}

// ============================================================================
// SECTION: Observer
// ============================================================================

/// Run observer that forwards every event to an audit sink.
pub struct AuditObserver {
    /// Destination sink.
    sink: Arc<dyn RunAuditSink>,
    /// Timestamp source for records.
    clock: Arc<dyn Clock>,
}

impl AuditObserver {
    /// Builds an observer stamping records with the system clock.
    #[must_use]
    pub fn new(sink: Arc<dyn RunAuditSink>) -> Self {
        Self::with_clock(sink, Arc::new(SystemClock))
    }

    /// Builds an observer with an explicit clock.
    #[must_use]
    pub fn with_clock(sink: Arc<dyn RunAuditSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sink,
            clock,
        }
    }
}

impl RunObserver for AuditObserver {
    fn on_event(&self, event: &RunEvent<'_>) {
        self.sink.record(&RunAuditEvent::from_event(event, self.clock.now()));
    }
}
