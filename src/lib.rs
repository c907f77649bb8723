/*!
 * # aicm - AI Content Management
 *
 * A Rust library for summarizing, translating and analyzing the sentiment of
 * local documents through a hosted language model.
 *
 * ## Features
 *
 * - Reads plain text (UTF-8 or Latin-1) and PDF documents
 * - Keeps document text out of the instruction channel with isolation markers
 * - Bounded retries with linear backoff around every model call
 * - Declarative response schemas checked before any result is trusted
 * - One pretty-printed JSON document per processed file
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `isolation`: Wraps untrusted text in boundary markers
 * - `executor`: Call sessions with retries and backoff
 * - `validation`: Response schemas and the generic validator
 * - `operations`: Language detection, summary, translation, sentiment
 * - `processor`: The read -> detect -> transform -> merge -> assemble pipeline
 * - `providers`: Model endpoint clients:
 *   - `providers::openai`: OpenAI chat completions client
 *   - `providers::mock`: Scripted provider for tests
 * - `file_utils`: Input document reading
 * - `output_manager`: Result document persistence
 * - `app_config`: Configuration and credential handling
 * - `app_controller`: Runs one use case with progress output
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod executor;
pub mod file_utils;
pub mod isolation;
pub mod language_utils;
pub mod operations;
pub mod output_manager;
pub mod processor;
pub mod providers;
pub mod validation;

// Re-export main types for easier usage
pub use app_config::{Config, Credential};
pub use app_controller::Controller;
pub use errors::{ApiError, CallError, FileError, PersistenceError, ProcessorError, ProviderError, ValidationError};
pub use executor::{CallExecutor, CallRequest, RetryPolicy};
pub use isolation::{isolate, ProtectedContent};
pub use operations::{ContentAnalyzer, UseCase};
pub use output_manager::{JsonResultStore, ResultStore, WorkflowRecord};
pub use processor::{TextProcessor, UseCaseRequest};
pub use validation::{validate, ValidatedResult};
