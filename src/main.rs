// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, error, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use doctrans::app_config::{self, Config, TranslationMode, TranslationProvider};
use doctrans::app_controller::Controller;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Deepl,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Deepl => TranslationProvider::DeepL,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
        }
    }
}

/// CLI Wrapper for TranslationMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationMode {
    /// Extract text, translate it in chunks and put it back
    TextBatch,
    /// Upload the whole document to the provider
    NativeDocument,
}

impl From<CliTranslationMode> for TranslationMode {
    fn from(cli_mode: CliTranslationMode) -> Self {
        match cli_mode {
            CliTranslationMode::TextBatch => TranslationMode::TextBatch,
            CliTranslationMode::NativeDocument => TranslationMode::NativeDocument,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// doctrans - structure-preserving document translation
///
/// Translates the text of docx/pptx/xlsx, HTML and plain-text files while
/// leaving their layout and markup untouched.
#[derive(Parser, Debug)]
#[command(name = "doctrans")]
#[command(version)]
#[command(about = "Structure-preserving document translation")]
#[command(long_about = "doctrans translates the text of office documents, HTML and plain text files \
while keeping every structural element unchanged.

EXAMPLES:
    doctrans report.docx                         # Translate using default config
    doctrans -s en -t de slides.pptx             # Translate from English to German
    doctrans -p deepl --mode native-document a.docx
    doctrans -o out/ --report page.html          # Print the JSON result record

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    deepl     - DeepL API, text and native documents (requires API key)
    anthropic - Anthropic Claude API, text only (requires API key)")]
struct CommandLineOptions {
    /// Document to translate (.docx, .pptx, .xlsx, .html, .htm, .xhtml, .txt, .md)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Source language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Send text batches or the whole document
    #[arg(long, value_enum)]
    mode: Option<CliTranslationMode>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Output directory, defaults to the input's directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Print the JSON result record to stdout
    #[arg(long)]
    report: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Tag and ANSI colour for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "\x1B[1;31m"),
            Level::Warn => ("WARN ", "\x1B[1;33m"),
            Level::Info => ("INFO ", "\x1B[1;32m"),
            Level::Debug => ("DEBUG", "\x1B[1;36m"),
            Level::Trace => ("TRACE", "\x1B[1;35m"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (tag, colour) = Self::style_for_level(record.level());
            let _ = writeln!(std::io::stderr(), "{}{} {} {}\x1B[0m", colour, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with trace level; the effective level is set below
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let options = CommandLineOptions::parse();
    run_translate(options).await
}

/// Load the config file, or write a default one when it is missing
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        return Config::from_file(config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    config
        .save(config_path)
        .context(format!("Failed to write default config to file: {}", config_path))?;
    Ok(config)
}

async fn run_translate(options: CommandLineOptions) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(config_log_level.to_level_filter());
    }

    let mut config = load_or_create_config(&options.config_path)?;

    // Override config with CLI options if provided
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(mode) = &options.mode {
        config.translation.mode = mode.clone().into();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;

    // Ctrl-C cancels the run; the pipeline stops at the next await point
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling translation");
                cancel.cancel();
            }
        });
    }

    let output_dir = options.output_dir.clone().unwrap_or_else(|| {
        options
            .input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });

    let outcome = controller
        .run(&options.input, &output_dir, options.force_overwrite, &cancel)
        .await?;

    let Some(report) = outcome.report else {
        return Ok(());
    };

    if options.report {
        println!("{}", report.to_json()?);
    }
    for warning in &report.warnings {
        warn!("{:?}: {}", warning.kind, warning.detail);
    }

    match &report.error {
        Some(report_error) => {
            error!("Translation failed ({:?}): {}", report_error.kind, report_error.detail);
            Err(anyhow!("Translation of {:?} failed", options.input))
        }
        None => {
            info!("Wrote {}", outcome.output_path.display());
            Ok(())
        }
    }
}
