/*!
 * Common test utilities for the aicm test suite
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use aicm::app_config::Config;
use aicm::executor::{CallExecutor, RecordingSleeper, RetryPolicy};
use aicm::file_utils::FileManager;
use aicm::operations::ContentAnalyzer;
use aicm::output_manager::JsonResultStore;
use aicm::processor::TextProcessor;
use aicm::providers::mock::{MockProvider, MockReply, RecordedRequest};

/// Routes log output through the test harness; safe to call from every test
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// English text of exactly 50 words
pub fn fifty_word_text() -> String {
    let sentence = "The quarterly report shows steady growth across all regions this year.";
    let mut words: Vec<&str> = Vec::new();
    while words.len() < 50 {
        for word in sentence.split_whitespace() {
            if words.len() < 50 {
                words.push(word);
            }
        }
    }
    words.join(" ")
}

/// Replies like a well-behaved model, keyed on the instruction text
pub fn english_model(request: &RecordedRequest) -> MockReply {
    let instruction = request.instruction.as_str();
    let payload = if instruction.starts_with("You are a language detection") {
        r#"{"language": "English"}"#
    } else if instruction.starts_with("You are a professional translator") {
        r#"{"translated_text": "El informe trimestral muestra un crecimiento constante.", "target_language": "Spanish"}"#
    } else if instruction.starts_with("You are a sentiment") {
        r#"{"sentiment": "negative", "confidence": 0.87, "explanation": "The text complains about delays and poor service."}"#
    } else {
        r#"{"summary": "Growth was steady across regions.", "key_points": ["Steady growth", "All regions", "Quarterly view"]}"#
    };
    MockReply::Payload(payload.to_string())
}

/// Config that writes into `output_dir` and never waits between retries
pub fn test_config(output_dir: &Path) -> Config {
    init_logging();
    let mut config = Config::default();
    config.output_dir = output_dir.to_string_lossy().to_string();
    config.retry.retry_delay_secs = 0;
    config
}

/// A file-backed processor around `provider`, recording pauses instead of sleeping
pub fn create_processor(provider: &MockProvider, output_dir: &Path) -> (TextProcessor, RecordingSleeper) {
    init_logging();
    let sleeper = RecordingSleeper::new();
    let executor = CallExecutor::new(provider.clone(), RetryPolicy::default()).with_sleeper(sleeper.clone());
    let processor = TextProcessor::new(
        ContentAnalyzer::new(executor),
        FileManager,
        JsonResultStore::new(output_dir),
    );
    (processor, sleeper)
}

/// Number of JSON documents in `dir`, zero when it does not exist
pub fn count_json_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
                .count()
        })
        .unwrap_or(0)
}
