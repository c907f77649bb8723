use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::app_config::{Config, Credential};
use crate::errors::ProcessorError;
use crate::executor::CallExecutor;
use crate::file_utils::FileManager;
use crate::operations::{ContentAnalyzer, UseCase};
use crate::output_manager::JsonResultStore;
use crate::processor::{ProcessedOutput, TextProcessor, UseCaseRequest, SOURCE_LANGUAGE_KEY};
use crate::providers::Provider;
use crate::providers::openai::OpenAI;

// @module: Application controller for document processing

/// Spinner shared between the controller and the stage listener
type SpinnerSlot = Arc<Mutex<Option<ProgressBar>>>;

/// Main application controller: one pipeline, one spinner
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Configured pipeline
    processor: TextProcessor,
    // @field: Spinner of the run in progress
    spinner: SpinnerSlot,
    // @field: Draw the spinner
    show_progress: bool,
}

impl Controller {
    // @method: Create a controller talking to the configured OpenAI endpoint
    pub fn with_config(config: Config, credential: &Credential) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;

        let provider = OpenAI::new(credential, config.endpoint.clone(), config.timeout());
        debug!("Using {} model {}", provider.name(), credential.model());
        Ok(Self::with_provider(config, provider))
    }

    // @method: Create a controller around any provider
    pub fn with_provider(config: Config, provider: impl Provider + 'static) -> Self {
        let executor = CallExecutor::new(provider, config.retry.to_policy());
        let analyzer = ContentAnalyzer::new(executor)
            .with_detect_sample_chars(config.detect_sample_chars)
            .with_structured_output(config.structured_output);
        let store = JsonResultStore::new(config.output_dir.clone());

        let spinner: SpinnerSlot = Arc::new(Mutex::new(None));
        let listener_slot = spinner.clone();
        let processor = TextProcessor::new(analyzer, FileManager, store).with_stage_listener(move |stage| {
            if let Some(bar) = lock(&listener_slot).as_ref() {
                bar.set_message(stage.to_string());
            }
        });

        Self {
            config,
            processor,
            spinner,
            show_progress: true,
        }
    }

    // @method: Enable or disable the spinner
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    // @returns: Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn start_spinner(&self, input_file: &Path) -> ProgressBar {
        let bar = if self.show_progress {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message(format!("Processing {}", input_file.display()));
        bar.enable_steady_tick(Duration::from_millis(120));
        *lock(&self.spinner) = Some(bar.clone());
        bar
    }

    /// Run one use case on one file and save the result
    pub async fn run(&self, input_file: &Path, request: &UseCaseRequest) -> Result<ProcessedOutput, ProcessorError> {
        let start_time = std::time::Instant::now();
        let bar = self.start_spinner(input_file);

        let outcome = self.processor.run(input_file, request).await;

        bar.finish_and_clear();
        *lock(&self.spinner) = None;

        match &outcome {
            Ok(output) => info!(
                "{} finished in {:.1}s",
                output.record.use_case,
                start_time.elapsed().as_secs_f64()
            ),
            Err(e) if e.is_persistence_failure() => error!("Processing succeeded but saving failed: {}", e),
            Err(e) => error!("{}", e),
        }
        outcome
    }
}

fn lock(slot: &SpinnerSlot) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Render a processed result for the terminal
pub fn render_result(output: &ProcessedOutput) -> String {
    let record = &output.record;
    let result = &record.result;
    let rule = "=".repeat(60);
    let mut text = String::new();

    let _ = writeln!(text, "{}", rule);
    let _ = writeln!(text, "RESULTS");
    let _ = writeln!(text, "{}", rule);
    let _ = writeln!(text, "File: {}", record.source_name);
    let _ = writeln!(text, "Language detected: {}", record.detected_language);
    let _ = writeln!(text, "Word count: {}", record.word_count);
    let _ = writeln!(text);

    match record.use_case {
        UseCase::Summarize => {
            let _ = writeln!(text, "Summary:");
            let _ = writeln!(text, "{}", result.get_str("summary").unwrap_or_default());
            let _ = writeln!(text);
            let _ = writeln!(text, "Key Points:");
            for (i, point) in result.get_list("key_points").iter().enumerate() {
                let _ = writeln!(text, "  {}. {}", i + 1, point);
            }
        }
        UseCase::Translate => {
            let _ = writeln!(
                text,
                "Source Language: {}",
                result.get_str(SOURCE_LANGUAGE_KEY).unwrap_or("N/A")
            );
            let _ = writeln!(
                text,
                "Target Language: {}",
                result.get_str("target_language").unwrap_or("N/A")
            );
            let _ = writeln!(text);
            let _ = writeln!(text, "Translation:");
            let _ = writeln!(text, "{}", result.get_str("translated_text").unwrap_or_default());
        }
        UseCase::Sentiment => {
            let _ = writeln!(
                text,
                "Sentiment: {}",
                result.get_str("sentiment").unwrap_or_default().to_uppercase()
            );
            let _ = writeln!(
                text,
                "Confidence: {:.2}%",
                result.get_f64("confidence").unwrap_or_default() * 100.0
            );
            let _ = writeln!(text, "Explanation:");
            let _ = writeln!(text, "{}", result.get_str("explanation").unwrap_or_default());
        }
    }

    let _ = writeln!(text);
    let _ = writeln!(text, "Result saved to: {}", output.location);
    let _ = write!(text, "{}", rule);
    text
}
