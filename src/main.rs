// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug};
use std::io::Write;
use std::path::PathBuf;

use aicm::app_config::{Config, Credential, LogLevel};
use aicm::app_controller::{Controller, render_result};
use aicm::processor::UseCaseRequest;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a concise summary and 3-5 key points
    Summarize {
        /// Input document (.txt or .pdf)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Translate a document into another language
    Translate {
        /// Input document (.txt or .pdf)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target language name or ISO code (e.g. 'Spanish', 'es', 'fra')
        #[arg(short = 't', long = "to", value_name = "LANG")]
        target_language: String,
    },

    /// Analyze the sentiment and tone of a document
    Sentiment {
        /// Input document (.txt or .pdf)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Generate shell completions for aicm
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// aicm - AI Content Management
///
/// Summarizes, translates and analyzes the sentiment of local documents
/// through an OpenAI-compatible chat completions endpoint.
#[derive(Parser, Debug)]
#[command(name = "aicm")]
#[command(version)]
#[command(about = "AI-powered document summarization, translation and sentiment analysis")]
#[command(long_about = "aicm sends a local .txt or .pdf document to a language model and saves a structured JSON result.

EXAMPLES:
    aicm summarize report.pdf                  # Summary and key points
    aicm translate notes.txt --to Spanish      # Translate into Spanish
    aicm translate notes.txt -t fr             # ISO codes are accepted too
    aicm sentiment review.txt                  # Sentiment with confidence
    aicm -o results summarize report.pdf       # Write results to ./results
    aicm completions bash > aicm.bash          # Generate bash completions

CONFIGURATION:
    Settings are read from aicm.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically. The API key is read from OPENAI_API_KEY and
    is never written to the config file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "aicm.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Directory for result documents
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,

    /// API key for the model endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Model name to use
    #[arg(short, long, env = "OPENAI_MODEL", global = true)]
    model: Option<String>,

    /// Do not draw the progress spinner
    #[arg(long, global = true)]
    no_progress: bool,
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

    // @returns: ANSI colour and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "ERROR"),
            Level::Warn => ("1;33", "WARN "),
            Level::Info => ("1;32", "INFO "),
            Level::Debug => ("1;36", "DEBUG"),
            Level::Trace => ("1;35", "TRACE"),
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
            let (colour, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the max level is narrowed once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(log_level) = cli.log_level {
        log::set_max_level(LogLevel::from(log_level).to_level_filter());
    }

    let (file, request) = match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(*shell, &mut cmd, "aicm", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Summarize { file } => (file.clone(), UseCaseRequest::Summarize),
        Commands::Translate { file, target_language } => (
            file.clone(),
            UseCaseRequest::Translate {
                target_language: target_language.clone(),
            },
        ),
        Commands::Sentiment { file } => (file.clone(), UseCaseRequest::Sentiment),
    };

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.to_string_lossy().to_string();
    }
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    // Missing credential is the only startup condition that stops the process
    let credential = Credential::resolve(cli.api_key.as_deref(), cli.model.as_deref(), &config)
        .context("Cannot start without an API key")?;
    debug!("Loaded {:?}", credential);

    let controller = Controller::with_config(config, &credential)?.with_progress(!cli.no_progress);
    let output = controller.run(&file, &request).await?;

    println!("{}", render_result(&output));
    Ok(())
}
