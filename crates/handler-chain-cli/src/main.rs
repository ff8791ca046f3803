// crates/handler-chain-cli/src/main.rs
// ============================================================================
// Module: Handler Chain CLI Entry Point
// Description: Command dispatcher for the handler chain simulator.
// Purpose: Run simulations and inspect stages, presets, and configuration.
// Dependencies: clap, handler-chain-config, handler-chain-core, handler-chain-oracle, tokio.
// ============================================================================

//! ## Overview
//! The `handler-chain` CLI wires a [`PipelineRunner`] to the configured oracle,
//! renders each stage as it resolves, and exits with a status that reflects
//! the run outcome. All user-facing strings are routed through the i18n
//! catalog. Ctrl-C resets the runner so the in-flight run ends as cancelled.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use handler_chain_cli::audit::AuditObserver;
use handler_chain_cli::audit::sink_from_config;
use handler_chain_cli::i18n::Locale;
use handler_chain_cli::i18n::set_locale;
use handler_chain_cli::render::ConsoleRenderer;
use handler_chain_cli::t;
use handler_chain_config::AuditSinkKind;
use handler_chain_config::ConfigError;
use handler_chain_config::HandlerChainConfig;
use handler_chain_config::OracleKind;
use handler_chain_core::DecisionOracle;
use handler_chain_core::PipelineRunner;
use handler_chain_core::RunOutcome;
use handler_chain_core::RunReport;
use handler_chain_core::Scenario;
use handler_chain_core::ScenarioPreset;
use handler_chain_core::StageCatalog;
use handler_chain_oracle::GeminiOracle;
use handler_chain_oracle::ScriptedOracle;
use thiserror::Error;

// ============================================================================
// SECTION: Limits and Defaults
// ============================================================================

/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "HANDLER_CHAIN_LANG";
/// Maximum accepted `--delay-ms` value.
const MAX_DELAY_MS: u64 = 60_000;
/// Exit status for a short-circuited run.
const EXIT_SHORT_CIRCUITED: u8 = 2;
/// Exit status for a run cancelled by interrupt.
const EXIT_CANCELLED: u8 = 130;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "handler-chain", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `HANDLER_CHAIN_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one request through the handler chain.
    Run(RunCommand),
    /// List the configured handler stages.
    Stages(ConfigArgs),
    /// List the built-in scenario presets.
    Scenarios,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Free-text request description.
    #[arg(long, value_name = "TEXT", conflicts_with = "preset")]
    scenario: Option<String>,
    /// Built-in scenario preset (defaults to `safe-request`).
    #[arg(long, value_name = "NAME", value_parser = parse_preset)]
    preset: Option<ScenarioPreset>,
    /// Oracle override.
    #[arg(long, value_enum)]
    oracle: Option<OracleArg>,
    /// Stage delay override in milliseconds.
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(0..=MAX_DELAY_MS))]
    delay_ms: Option<u64>,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Configuration file selection.
    #[command(flatten)]
    config: ConfigArgs,
}

/// Shared `--config` argument.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Path to `handler-chain.toml` (overrides `HANDLER_CHAIN_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate configuration.
    Validate(ConfigArgs),
}

/// Locale arguments.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LangArg {
    /// English.
    En,
    /// Vietnamese.
    Vi,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Vi => Self::Vi,
        }
    }
}

/// Oracle selection arguments.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OracleArg {
    /// Remote Gemini model.
    Gemini,
    /// Offline keyword rules.
    Scripted,
}

impl From<OracleArg> for OracleKind {
    fn from(value: OracleArg) -> Self {
        match value {
            OracleArg::Gemini => Self::Gemini,
            OracleArg::Scripted => Self::Scripted,
        }
    }
}

/// Output format for `run`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// Live text rendering.
    Text,
    /// Single JSON run report.
    Json,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(command) => command_run(command, locale).await,
        Commands::Stages(args) => command_stages(&args),
        Commands::Scenarios => command_scenarios(),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

// ============================================================================
// SECTION: Run Command
// ============================================================================

/// Executes the `run` command.
async fn command_run(command: RunCommand, locale: Locale) -> CliResult<ExitCode> {
    let mut config = load_config(command.config.config.as_deref())?;
    if let Some(delay_ms) = command.delay_ms {
        config.runner.stage_delay_ms = delay_ms;
    }
    if let Some(oracle) = command.oracle {
        config.oracle.kind = oracle.into();
    }
    let scenario = resolve_scenario(command.scenario.as_deref(), command.preset)?;
    let catalog = config.catalog().map_err(config_error)?;
    let total = catalog.len();
    let oracle = build_oracle(&config, locale)?;
    let sink = sink_from_config(&config.audit).map_err(|err| {
        CliError::new(t!(
            "audit.open_failed",
            path = config.audit.path.as_deref().unwrap_or_default(),
            error = err
        ))
    })?;

    let runner_config = config.runner.runner_config(&t!("runner.fallback_reason"));
    let mut runner = PipelineRunner::new(catalog, oracle, runner_config)
        .with_observer(Arc::new(AuditObserver::new(sink)));
    if command.format == OutputFormat::Text {
        runner = runner.with_observer(Arc::new(ConsoleRenderer::stdout(locale, total)));
    }

    let report = drive(&runner, &scenario).await?;
    match command.format {
        OutputFormat::Text => {
            if report.outcome == RunOutcome::Cancelled {
                write_stdout_line(&t!("run.status.cancelled"))
                    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            }
        }
        OutputFormat::Json => {
            let payload = serde_json::to_string_pretty(&report)
                .map_err(|err| CliError::new(t!("run.report_failed", error = err)))?;
            write_stdout_line(&payload)
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::from(exit_status_for(report.outcome)))
}

/// Runs the scenario, resetting the runner on Ctrl-C.
async fn drive(runner: &PipelineRunner, scenario: &Scenario) -> CliResult<RunReport> {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    drive_until(runner, scenario, ctrl_c).await
}

/// Runs the scenario, resetting the runner once `interrupt` resolves.
///
/// A reset wakes the run task, so the cancelled report is returned without
/// waiting for the pending oracle call.
async fn drive_until(
    runner: &PipelineRunner,
    scenario: &Scenario,
    interrupt: impl Future<Output = ()>,
) -> CliResult<RunReport> {
    let run = runner.start(scenario);
    tokio::pin!(run);
    let result = tokio::select! {
        result = &mut run => result,
        () = interrupt => {
            let _ = write_stderr_line(&t!("run.interrupted"));
            runner.reset();
            run.await
        }
    };
    result.map_err(|_| CliError::new(t!("run.already_running")))
}

/// Builds the oracle selected by configuration.
fn build_oracle(
    config: &HandlerChainConfig,
    locale: Locale,
) -> CliResult<Arc<dyn DecisionOracle>> {
    let language = config.oracle.language.unwrap_or(locale.prompt_language());
    match config.oracle.kind {
        OracleKind::Scripted => Ok(Arc::new(ScriptedOracle::builtin_in(language))),
        OracleKind::Gemini => {
            let label = oracle_label(OracleKind::Gemini);
            let api_key = config.oracle.resolve_api_key().map_err(|err| {
                CliError::new(t!("oracle.init_failed", oracle = label, error = err))
            })?;
            let gemini_config = config.oracle.gemini_config(api_key, language);
            let oracle = GeminiOracle::new(gemini_config).map_err(|err| {
                CliError::new(t!("oracle.init_failed", oracle = label, error = err))
            })?;
            Ok(Arc::new(oracle))
        }
    }
}

/// Resolves the scenario from free text or a preset.
fn resolve_scenario(text: Option<&str>, preset: Option<ScenarioPreset>) -> CliResult<Scenario> {
    match text {
        Some(text) => {
            Scenario::new(text).map_err(|err| CliError::new(t!("scenario.invalid", error = err)))
        }
        None => Ok(preset.unwrap_or_default().scenario()),
    }
}

/// Maps a run outcome to the process exit status.
const fn exit_status_for(outcome: RunOutcome) -> u8 {
    match outcome {
        RunOutcome::Completed => 0,
        RunOutcome::ShortCircuited => EXIT_SHORT_CIRCUITED,
        RunOutcome::Cancelled => EXIT_CANCELLED,
    }
}

/// Parses a `--preset` value.
fn parse_preset(value: &str) -> Result<ScenarioPreset, String> {
    ScenarioPreset::parse(value).map_err(|err| err.to_string())
}

// ============================================================================
// SECTION: Listing Commands
// ============================================================================

/// Executes the `stages` command.
fn command_stages(args: &ConfigArgs) -> CliResult<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let catalog = config.catalog().map_err(config_error)?;
    for line in stage_lines(&catalog) {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Formats the stage listing.
fn stage_lines(catalog: &StageCatalog) -> Vec<String> {
    let mut lines = vec![t!("stages.header", count = catalog.len())];
    lines.extend(catalog.iter().enumerate().map(|(index, stage)| {
        t!(
            "stages.entry",
            position = index + 1,
            id = stage.identifier,
            name = stage.display_name,
            description = stage.description
        )
    }));
    lines
}

/// Executes the `scenarios` command.
fn command_scenarios() -> CliResult<ExitCode> {
    for line in scenario_lines() {
        write_stdout_line(&line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Formats the preset listing.
fn scenario_lines() -> Vec<String> {
    let mut lines = vec![t!("scenarios.header")];
    lines.extend(ScenarioPreset::ALL.iter().map(|preset| {
        let stage =
            preset.expected_block().map_or_else(|| t!("scenarios.no_block"), str::to_string);
        t!(
            "scenarios.entry",
            slug = preset.slug(),
            label = preset.label(),
            text = preset.request_text(),
            stage = stage
        )
    }));
    lines
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Executes the `config` command family.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(args) => {
            let config = load_config(args.config.as_deref())?;
            let stages = config.catalog().map_err(config_error)?.len();
            let message = t!(
                "config.valid",
                stages = stages,
                oracle = oracle_label(config.oracle.kind),
                audit = audit_label(config.audit.sink)
            );
            write_stdout_line(&message)
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads configuration with localized errors.
fn load_config(path: Option<&Path>) -> CliResult<HandlerChainConfig> {
    HandlerChainConfig::load(path).map_err(config_error)
}

/// Wraps a configuration error in a localized CLI error.
fn config_error(err: ConfigError) -> CliError {
    CliError::new(t!("config.load_failed", error = err))
}

/// Returns the config label for an oracle kind.
const fn oracle_label(kind: OracleKind) -> &'static str {
    match kind {
        OracleKind::Gemini => "gemini",
        OracleKind::Scripted => "scripted",
    }
}

/// Returns the config label for an audit sink kind.
const fn audit_label(kind: AuditSinkKind) -> &'static str {
    match kind {
        AuditSinkKind::None => "none",
        AuditSinkKind::Stderr => "stderr",
        AuditSinkKind::File => "file",
    }
}

// ============================================================================
// SECTION: Locale
// ============================================================================

/// Resolves the CLI locale from flags or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Renders top-level help to stdout.
fn show_help() -> CliResult<()> {
    let help = Cli::command().render_help();
    write_stdout_line(&help.to_string()).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.stdout"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
