/*!
 * Workflow pipeline.
 *
 * One invocation walks a fixed sequence of states and stops at the first
 * failure:
 *
 * `Start -> Read -> DetectLanguage -> Transform -> Merge -> Assemble`
 *
 * and `run` adds a final `Persist` step. The `Merge` state folds the detected
 * language into a translation result as `source_language`; assembling a
 * translate record without it is rejected. Every failure leaves the pipeline
 * as a `ProcessorError`.
 */

use std::fmt;
use std::path::Path;

use log::{debug, info, warn};

use crate::errors::ProcessorError;
use crate::file_utils::{Document, DocumentReader};
use crate::language_utils::{normalize_target_language, same_language};
use crate::operations::{ContentAnalyzer, UseCase};
use crate::output_manager::{ResultStore, WorkflowRecord};
use crate::validation::ValidatedResult;

/// Key merged into translation results
pub const SOURCE_LANGUAGE_KEY: &str = "source_language";

/// What the operator asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UseCaseRequest {
    /// Summarize the document
    Summarize,
    /// Translate the document
    Translate {
        /// Language name or ISO 639 code
        target_language: String,
    },
    /// Analyze the document's sentiment
    Sentiment,
}

impl UseCaseRequest {
    /// Use case this request maps to
    pub fn use_case(&self) -> UseCase {
        match self {
            Self::Summarize => UseCase::Summarize,
            Self::Translate { .. } => UseCase::Translate,
            Self::Sentiment => UseCase::Sentiment,
        }
    }
}

/// Pipeline position, reported to stage listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Request checked, nothing read yet
    Start,
    /// Reading the input document
    Read,
    /// Probing the document's language
    DetectLanguage,
    /// Running the requested transform
    Transform,
    /// Folding pipeline data into the result
    Merge,
    /// Building the workflow record
    Assemble,
    /// Handing the record to the result store
    Persist,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Start => "Starting",
            Self::Read => "Reading file",
            Self::DetectLanguage => "Detecting language",
            Self::Transform => "Processing",
            Self::Merge => "Merging results",
            Self::Assemble => "Assembling record",
            Self::Persist => "Saving result",
        };
        f.write_str(label)
    }
}

/// Called on every stage transition
pub type StageListener = Box<dyn Fn(PipelineStage) + Send + Sync>;

/// Data carried between states
enum PipelineState {
    Start,
    Read(Document),
    Detected {
        document: Document,
        language: String,
    },
    Transformed {
        document: Document,
        language: String,
        result: ValidatedResult,
    },
    Merged {
        document: Document,
        language: String,
        result: ValidatedResult,
    },
    Assembled(WorkflowRecord),
}

impl PipelineState {
    /// Stage the next transition performs
    fn next_stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Start => Some(PipelineStage::Read),
            Self::Read(_) => Some(PipelineStage::DetectLanguage),
            Self::Detected { .. } => Some(PipelineStage::Transform),
            Self::Transformed { .. } => Some(PipelineStage::Merge),
            Self::Merged { .. } => Some(PipelineStage::Assemble),
            Self::Assembled(_) => None,
        }
    }
}

/// A record together with where it was saved
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedOutput {
    /// The assembled record
    pub record: WorkflowRecord,
    /// Location reported by the result store
    pub location: String,
}

/// Sequences read, detection, transform and persistence for one document
pub struct TextProcessor {
    analyzer: ContentAnalyzer,
    reader: Box<dyn DocumentReader>,
    store: Box<dyn ResultStore>,
    listener: Option<StageListener>,
}

impl fmt::Debug for TextProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextProcessor")
            .field("analyzer", &self.analyzer)
            .finish_non_exhaustive()
    }
}

impl TextProcessor {
    /// Create a processor from its collaborators
    pub fn new(
        analyzer: ContentAnalyzer,
        reader: impl DocumentReader + 'static,
        store: impl ResultStore + 'static,
    ) -> Self {
        Self {
            analyzer,
            reader: Box::new(reader),
            store: Box::new(store),
            listener: None,
        }
    }

    /// Register a stage listener
    pub fn with_stage_listener(mut self, listener: impl Fn(PipelineStage) + Send + Sync + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    fn enter(&self, stage: PipelineStage) {
        debug!("Pipeline stage: {:?}", stage);
        if let Some(listener) = &self.listener {
            listener(stage);
        }
    }

    /// Perform one transition
    async fn advance(
        &self,
        state: PipelineState,
        path: &Path,
        request: &UseCaseRequest,
    ) -> Result<PipelineState, ProcessorError> {
        match state {
            PipelineState::Start => {
                let document = self.reader.read(path)?;
                info!("Read {} ({} words)", document.name, document.word_count());
                Ok(PipelineState::Read(document))
            }

            PipelineState::Read(document) => {
                let language = self.analyzer.detect_language(&document.text).await?;
                Ok(PipelineState::Detected { document, language })
            }

            PipelineState::Detected { document, language } => {
                let result = match request {
                    UseCaseRequest::Summarize => self.analyzer.summarize(&document.text).await?,
                    UseCaseRequest::Translate { target_language } => {
                        self.analyzer.translate(&document.text, target_language).await?
                    }
                    UseCaseRequest::Sentiment => self.analyzer.analyze_sentiment(&document.text).await?,
                };
                info!("{} completed for {}", request.use_case(), document.name);
                Ok(PipelineState::Transformed {
                    document,
                    language,
                    result,
                })
            }

            PipelineState::Transformed {
                document,
                language,
                result,
            } => {
                let result = match request {
                    UseCaseRequest::Translate { target_language } => {
                        if same_language(&language, target_language) {
                            warn!("{} is already in {}", document.name, target_language);
                        }
                        result.with_field(SOURCE_LANGUAGE_KEY, language.as_str())
                    }
                    _ => result,
                };
                Ok(PipelineState::Merged {
                    document,
                    language,
                    result,
                })
            }

            PipelineState::Merged {
                document,
                language,
                result,
            } => {
                let use_case = request.use_case();
                if use_case == UseCase::Translate && !result.contains_key(SOURCE_LANGUAGE_KEY) {
                    return Err(ProcessorError::Unknown(
                        "translation result was assembled without a source language".to_string(),
                    ));
                }
                let word_count = document.word_count();
                Ok(PipelineState::Assembled(WorkflowRecord::new(
                    document.name,
                    use_case,
                    language,
                    word_count,
                    result,
                )))
            }

            PipelineState::Assembled(record) => Ok(PipelineState::Assembled(record)),
        }
    }

    /// Check the request before anything is read or sent
    fn prepare(&self, request: &UseCaseRequest) -> Result<UseCaseRequest, ProcessorError> {
        match request {
            UseCaseRequest::Translate { target_language } => {
                let normalized = normalize_target_language(target_language)
                    .map_err(|e| ProcessorError::Unknown(e.to_string()))?;
                Ok(UseCaseRequest::Translate {
                    target_language: normalized,
                })
            }
            other => Ok(other.clone()),
        }
    }

    /// Run the pipeline up to an assembled record, without saving it
    pub async fn process(&self, path: &Path, request: &UseCaseRequest) -> Result<WorkflowRecord, ProcessorError> {
        self.enter(PipelineStage::Start);
        let request = self.prepare(request)?;
        info!("Starting {} for {}", request.use_case(), path.display());

        let mut state = PipelineState::Start;
        while let Some(stage) = state.next_stage() {
            self.enter(stage);
            state = self.advance(state, path, &request).await?;
        }

        match state {
            PipelineState::Assembled(record) => Ok(record),
            _ => Err(ProcessorError::Unknown("pipeline stopped before assembling a record".to_string())),
        }
    }

    /// Persist an assembled record
    pub fn save(&self, record: &WorkflowRecord) -> Result<String, ProcessorError> {
        self.enter(PipelineStage::Persist);
        Ok(self.store.persist(record)?)
    }

    /// Run the whole pipeline; success requires the record to be saved
    pub async fn run(&self, path: &Path, request: &UseCaseRequest) -> Result<ProcessedOutput, ProcessorError> {
        let record = self.process(path, request).await?;
        let location = self.save(&record)?;
        Ok(ProcessedOutput { record, location })
    }

    /// Summarize a file and return the record
    pub async fn process_summarization(&self, path: &Path) -> Result<WorkflowRecord, ProcessorError> {
        self.process(path, &UseCaseRequest::Summarize).await
    }

    /// Translate a file and return the record
    pub async fn process_translation(&self, path: &Path, target_language: &str) -> Result<WorkflowRecord, ProcessorError> {
        let request = UseCaseRequest::Translate {
            target_language: target_language.to_string(),
        };
        self.process(path, &request).await
    }

    /// Analyze a file's sentiment and return the record
    pub async fn process_sentiment(&self, path: &Path) -> Result<WorkflowRecord, ProcessorError> {
        self.process(path, &UseCaseRequest::Sentiment).await
    }
}
