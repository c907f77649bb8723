/*!
 * Result persistence.
 *
 * Every successful pipeline run becomes one pretty-printed JSON document in
 * the output directory, named `{base}_{use_case}_{YYYY-MM-DD_HH-MM-SS}.json`.
 * The document is checked against its top-level schema before it is written
 * and again when it is loaded back.
 */

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PersistenceError;
use crate::file_utils::FileManager;
use crate::operations::UseCase;
use crate::validation::ValidatedResult;

/// Default output directory
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Top-level keys every result document must carry
pub const REQUIRED_FIELDS: &[&str] = &[
    "file",
    "use_case",
    "timestamp",
    "result",
    "word_count",
    "language_detected",
];

/// ISO-8601 format of the `timestamp` field
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Timestamp format used in file names
pub const FILENAME_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// The outcome of one successful pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowRecord {
    /// Input file stem
    pub source_name: String,
    /// Transform that produced the result
    pub use_case: UseCase,
    /// Language detected on the input
    pub detected_language: String,
    /// Whitespace separated words in the input
    pub word_count: usize,
    /// Validated transform result
    pub result: ValidatedResult,
    /// Local time of assembly, to the second
    pub timestamp: NaiveDateTime,
}

impl WorkflowRecord {
    /// Create a record stamped with the current local time
    pub fn new(
        source_name: impl Into<String>,
        use_case: UseCase,
        detected_language: impl Into<String>,
        word_count: usize,
        result: ValidatedResult,
    ) -> Self {
        let now = Local::now().naive_local();
        Self {
            source_name: source_name.into(),
            use_case,
            detected_language: detected_language.into(),
            word_count,
            result,
            timestamp: now.with_nanosecond(0).unwrap_or(now),
        }
    }

    /// Replace the timestamp
    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// On-disk shape of a result document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDocument {
    /// Input file stem
    pub file: String,
    /// Use case name
    pub use_case: String,
    /// ISO-8601 local timestamp
    pub timestamp: String,
    /// Transform result
    pub result: ValidatedResult,
    /// Word count of the input
    pub word_count: usize,
    /// Detected language
    pub language_detected: String,
}

/// Stores workflow records somewhere and says where
pub trait ResultStore: Send + Sync {
    /// Persist `record` and return its location
    fn persist(&self, record: &WorkflowRecord) -> Result<String, PersistenceError>;
}

/// Writes each record as a JSON file in one directory
#[derive(Debug, Clone)]
pub struct JsonResultStore {
    output_dir: PathBuf,
}

impl Default for JsonResultStore {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}

impl JsonResultStore {
    /// Create a store writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory the store writes into
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory if needed
    pub fn ensure_output_dir(&self) -> Result<&Path, PersistenceError> {
        FileManager::ensure_dir(&self.output_dir).map_err(|source| PersistenceError::Io {
            path: self.output_dir.clone(),
            source,
        })?;
        Ok(&self.output_dir)
    }

    /// File name for a record: `{base}_{use_case}_{YYYY-MM-DD_HH-MM-SS}.json`
    pub fn generate_filename(base_name: &str, use_case: UseCase, timestamp: &NaiveDateTime) -> String {
        format!(
            "{}_{}_{}.json",
            base_name,
            use_case,
            timestamp.format(FILENAME_TIME_FORMAT)
        )
    }

    /// Build the document for `record`
    pub fn prepare_output(record: &WorkflowRecord) -> OutputDocument {
        OutputDocument {
            file: record.source_name.clone(),
            use_case: record.use_case.to_string(),
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            result: record.result.clone(),
            word_count: record.word_count,
            language_detected: record.detected_language.clone(),
        }
    }

    /// Check the top-level fields of a result document
    pub fn validate_output_schema(data: &Value) -> Result<(), PersistenceError> {
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| data.get(**field).is_none())
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PersistenceError::MissingFields(missing));
        }

        let use_case = &data["use_case"];
        if use_case.as_str().and_then(|name| name.parse::<UseCase>().ok()).is_none() {
            let shown = use_case.as_str().map(str::to_string).unwrap_or_else(|| use_case.to_string());
            return Err(PersistenceError::InvalidUseCase(shown));
        }

        let word_count = &data["word_count"];
        if !(word_count.is_u64() || word_count.is_i64()) {
            return Err(PersistenceError::InvalidWordCount);
        }

        Ok(())
    }

    /// Read a result document back into a record
    pub fn load_record<P: AsRef<Path>>(path: P) -> Result<WorkflowRecord, PersistenceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let data: Value = serde_json::from_str(&content)?;
        Self::validate_output_schema(&data)?;

        let document: OutputDocument = serde_json::from_value(data)?;
        let use_case = document
            .use_case
            .parse::<UseCase>()
            .map_err(PersistenceError::InvalidUseCase)?;
        let timestamp = NaiveDateTime::parse_from_str(&document.timestamp, TIMESTAMP_FORMAT)
            .map_err(|_| PersistenceError::InvalidTimestamp(document.timestamp.clone()))?;

        Ok(WorkflowRecord {
            source_name: document.file,
            use_case,
            detected_language: document.language_detected,
            word_count: document.word_count,
            result: document.result,
            timestamp,
        })
    }
}

impl ResultStore for JsonResultStore {
    fn persist(&self, record: &WorkflowRecord) -> Result<String, PersistenceError> {
        let document = Self::prepare_output(record);
        Self::validate_output_schema(&serde_json::to_value(&document)?)?;

        let output_dir = self.ensure_output_dir()?;
        let filename = Self::generate_filename(&record.source_name, record.use_case, &record.timestamp);
        let output_path = output_dir.join(filename);

        let json = serde_json::to_string_pretty(&document)?;
        debug!("Writing {} bytes to {:?}", json.len(), output_path);
        fs::write(&output_path, json).map_err(|source| PersistenceError::Io {
            path: output_path.clone(),
            source,
        })?;

        info!("Result saved to {}", output_path.display());
        Ok(output_path.to_string_lossy().to_string())
    }
}
