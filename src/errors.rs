/*!
 * Error types for the aicm application.
 *
 * Each layer owns one error enum, declared with thiserror. Lower layers are
 * wrapped, never flattened into strings, so callers can match on the variant
 * that actually failed:
 *
 * - `ProviderError`: one failed request to the model endpoint
 * - `CallError`: every attempt of a call session failed
 * - `ValidationError`: the model answered, but not in the agreed shape
 * - `FileError`: the input document could not be read
 * - `PersistenceError`: the result document could not be written or reloaded
 * - `ProcessorError`: the only error that leaves the workflow pipeline
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when talking to the model endpoint.
///
/// The call executor treats every variant as a transient failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The endpoint answered without any content
    #[error("Empty response from API")]
    EmptyResponse,
}

/// A call session ended without a successful attempt.
///
/// Only the cause of the final attempt is kept.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("API call failed after {attempts} attempts: {cause}")]
pub struct CallError {
    /// Number of attempts made before giving up
    pub attempts: u32,
    /// Failure observed on the last attempt
    #[source]
    pub cause: ProviderError,
}

/// The model's reply does not satisfy an operation's response schema.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The payload is not JSON at all
    #[error("Invalid JSON response from API: {0}")]
    InvalidJson(String),

    /// The payload is JSON but not an object
    #[error("API response must be a JSON object, got {0}")]
    NotAnObject(String),

    /// One or more required keys are absent
    #[error("API response missing required keys: {}", .0.join(", "))]
    MissingKeys(Vec<String>),

    /// A key holds a value of the wrong JSON type
    #[error("Field '{key}' must be {expected}")]
    WrongType {
        /// Offending key
        key: String,
        /// Human readable description of the expected type
        expected: &'static str,
    },

    /// A sequence field has too few or too many items
    #[error("Field '{key}' must contain {min}-{max} items, got {len}")]
    BadLength {
        /// Offending key
        key: String,
        /// Actual number of items
        len: usize,
        /// Inclusive lower bound
        min: usize,
        /// Inclusive upper bound
        max: usize,
    },

    /// A numeric field is outside its allowed interval
    #[error("Field '{key}' must be a number between {min} and {max}, got {value}")]
    OutOfRange {
        /// Offending key
        key: String,
        /// Value as received
        value: String,
        /// Inclusive lower bound
        min: f64,
        /// Inclusive upper bound
        max: f64,
    },

    /// An enumerated field holds a value outside its vocabulary
    #[error("Invalid {key} value '{value}'. Must be one of: {}", .allowed.join(", "))]
    NotInVocabulary {
        /// Offending key
        key: String,
        /// Value as received
        value: String,
        /// Accepted values
        allowed: Vec<String>,
    },
}

/// Errors raised while reading an input document.
#[derive(Error, Debug)]
pub enum FileError {
    /// The path does not exist
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// The path exists but is a directory or special file
    #[error("Path is not a file: {0}")]
    NotAFile(PathBuf),

    /// The extension is not one of the supported document types
    #[error("Unsupported file type: {extension}. Supported types: {supported}")]
    UnsupportedExtension {
        /// Extension as found on the path (may be empty)
        extension: String,
        /// Comma separated list of supported extensions
        supported: String,
    },

    /// The document holds no readable text
    #[error("File is empty: {0}")]
    Empty(PathBuf),

    /// An I/O error while reading the document
    #[error("Error reading file {path}: {source}")]
    Read {
        /// Path being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The PDF could not be decoded
    #[error("Invalid or corrupted PDF file {path}: {message}")]
    Pdf {
        /// Path being read
        path: PathBuf,
        /// Decoder message
        message: String,
    },
}

/// Errors raised while writing or reloading a result document.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The output document lacks required top-level fields
    #[error("Output data missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// The use case is not one of the known transforms
    #[error("Invalid use_case: {0}. Must be one of: summarize, translate, sentiment")]
    InvalidUseCase(String),

    /// The word count is not an integer
    #[error("word_count must be an integer")]
    InvalidWordCount,

    /// The timestamp is not an ISO-8601 date-time
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The document could not be converted to or from JSON
    #[error("Error serializing output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The document could not be written or read
    #[error("Error saving output file {path}: {source}")]
    Io {
        /// Path being written or read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Failures of the language model steps of the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The endpoint could not be reached after all retries
    #[error(transparent)]
    Call(#[from] CallError),

    /// The endpoint answered with an unusable payload
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// The single error type surfaced by the workflow pipeline.
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// The input document could not be read
    #[error("File handling error: {0}")]
    File(#[from] FileError),

    /// Language detection or the transform itself failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The transform succeeded but the result could not be saved
    #[error("Failed to save output: {0}")]
    Persistence(#[from] PersistenceError),

    /// Anything else
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl ProcessorError {
    /// Whether the transform itself succeeded and only saving failed
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

impl From<CallError> for ProcessorError {
    fn from(error: CallError) -> Self {
        Self::Api(ApiError::Call(error))
    }
}

impl From<ValidationError> for ProcessorError {
    fn from(error: ValidationError) -> Self {
        Self::Api(ApiError::Validation(error))
    }
}

/// Errors in startup configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No API key was supplied; the process cannot start
    #[error("OPENAI_API_KEY not found in environment variables. Set it or pass --api-key")]
    MissingCredential,

    /// A configuration value is unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
