// crates/handler-chain-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings in English and Vietnamese.
// Dependencies: handler-chain-oracle (prompt language mapping)
// ============================================================================

//! ## Overview
//! The `handler-chain` CLI stores user-facing strings in a small translation
//! catalog. Runtime output goes through the [`t!`](crate::t) macro, which
//! reads the process locale, or [`t_in!`](crate::t_in) when a component
//! carries its own locale.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

use handler_chain_oracle::PromptLanguage;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported CLI locales.
///
/// # Invariants
/// - [`Locale::En`] is the default fallback locale.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    En,
    /// Vietnamese.
    Vi,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Vi => "vi",
        }
    }

    /// Attempts to parse a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        let lang = normalized.split(['-', '_', '.']).next().unwrap_or("");
        match lang {
            "en" => Some(Self::En),
            "vi" => Some(Self::Vi),
            _ => None,
        }
    }

    /// Returns the language the oracle prompt should request.
    #[must_use]
    pub const fn prompt_language(self) -> PromptLanguage {
        match self {
            Self::En => PromptLanguage::English,
            Self::Vi => PromptLanguage::Vietnamese,
        }
    }
}

/// Ordered list of supported CLI locales.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Vi];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
///
/// # Invariants
/// - `key` matches a placeholder name without braces (for example, `stage`).
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates.
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Global locale selection for CLI output.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the CLI locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the current CLI locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog entries.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "handler-chain {version}"),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected 'en' or 'vi'."),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("config.load_failed", "Failed to load configuration: {error}"),
    ("config.valid", "Configuration valid: {stages} stages, {oracle} oracle, audit sink {audit}."),
    ("oracle.init_failed", "Failed to initialize the {oracle} oracle: {error}"),
    ("audit.open_failed", "Failed to open audit log {path}: {error}"),
    ("scenario.invalid", "Invalid scenario: {error}"),
    ("run.already_running", "A pipeline run is already in progress."),
    ("run.report_failed", "Failed to serialize the run report: {error}"),
    ("run.interrupted", "Interrupt received; resetting the pipeline."),
    ("run.banner", "Incoming request: {scenario}"),
    ("run.stage.processing", "[{position}/{total}] {stage}: processing..."),
    ("run.stage.outcome", "    {time} {decision} [{code}] {reason}"),
    ("run.reset", "Pipeline reset."),
    ("run.status.ok", "PIPELINE_RESOLVED_OK: the request passed all {total} handlers."),
    ("run.status.blocked", "PIPELINE_SHORT_CIRCUITED: the request was blocked at {stage}."),
    ("run.status.cancelled", "PIPELINE_CANCELLED: the run was reset before it finished."),
    ("runner.fallback_reason", "AI engine connection error. Please try again later."),
    ("stages.header", "Handler stages ({count}):"),
    ("stages.entry", "  {position}. {id} ({name}): {description}"),
    ("scenarios.header", "Scenario presets:"),
    ("scenarios.entry", "  {slug} ({label}): {text} [expected block: {stage}]"),
    ("scenarios.no_block", "none"),
];

/// Vietnamese catalog entries.
const CATALOG_VI: &[(&str, &str)] = &[
    ("main.version", "handler-chain {version}"),
    ("i18n.lang.invalid_env", "Giá trị không hợp lệ cho {env}: {value}. Cần 'en' hoặc 'vi'."),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.write_failed", "Không thể ghi ra {stream}: {error}"),
    ("config.load_failed", "Không thể tải cấu hình: {error}"),
    (
        "config.valid",
        "Cấu hình hợp lệ: {stages} handler, oracle {oracle}, audit sink {audit}.",
    ),
    ("oracle.init_failed", "Không thể khởi tạo oracle {oracle}: {error}"),
    ("audit.open_failed", "Không thể mở audit log {path}: {error}"),
    ("scenario.invalid", "Kịch bản không hợp lệ: {error}"),
    ("run.already_running", "Pipeline đang chạy."),
    ("run.report_failed", "Không thể tuần tự hóa báo cáo: {error}"),
    ("run.interrupted", "Nhận tín hiệu ngắt; đang reset pipeline."),
    ("run.banner", "Request đầu vào: {scenario}"),
    ("run.stage.processing", "[{position}/{total}] {stage}: đang xử lý..."),
    ("run.stage.outcome", "    {time} {decision} [{code}] {reason}"),
    ("run.reset", "Đã reset pipeline."),
    ("run.status.ok", "PIPELINE_RESOLVED_OK: request đã qua cả {total} handler."),
    ("run.status.blocked", "PIPELINE_SHORT_CIRCUITED: request bị chặn tại {stage}."),
    ("run.status.cancelled", "PIPELINE_CANCELLED: lần chạy bị reset trước khi kết thúc."),
    ("runner.fallback_reason", "Lỗi kết nối AI Engine. Vui lòng thử lại sau."),
    ("stages.header", "Các handler ({count}):"),
    ("stages.entry", "  {position}. {id} ({name}): {description}"),
    ("scenarios.header", "Kịch bản mẫu:"),
    ("scenarios.entry", "  {slug} ({label}): {text} [dự kiến chặn tại: {stage}]"),
    ("scenarios.no_block", "không"),
];

/// Returns the raw catalog entries for the requested locale.
#[must_use]
pub const fn catalog_entries_for(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::En => CATALOG_EN,
        Locale::Vi => CATALOG_VI,
    }
}

/// Returns the message catalog for the requested locale.
fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_VI_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Vi => CATALOG_VI_MAP.get_or_init(|| CATALOG_VI.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the process locale while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    translate_in(current_locale(), key, args)
}

/// Translates `key` using an explicit locale while substituting `args`.
#[must_use]
pub fn translate_in(locale: Locale, key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog_for(locale)
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macros
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}

/// Formats a message like [`t!`](crate::t) in an explicit locale.
#[macro_export]
macro_rules! t_in {
    ($locale:expr, $key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate_in($locale, $key, args)
    }};
}

// ============================================================================
// SECTION: Tests
// ============================================================================
