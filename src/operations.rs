/*!
 * Transform operations.
 *
 * Each operation is a fixed configuration of an instruction template, a
 * response schema and the rule for which part of the text is sent. Running an
 * operation always goes isolate -> execute -> validate; operations never retry
 * on their own and never swallow a validation error.
 */

use std::fmt;
use std::str::FromStr;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;
use crate::executor::{CallExecutor, CallRequest, ResponseShape};
use crate::isolation::{isolate, ISOLATION_NOTICE};
use crate::validation::{validate, FieldRule, ResponseSchema, ValidatedResult, SENTIMENT_LABELS};

/// Characters of text sent to the language probe
pub const DETECT_SAMPLE_CHARS: usize = 500;

/// The transforms an operator can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseCase {
    /// Summary plus key points
    Summarize,
    /// Translation into a target language
    Translate,
    /// Sentiment label with confidence
    Sentiment,
}

impl UseCase {
    /// Every use case, in menu order
    pub const ALL: [UseCase; 3] = [UseCase::Summarize, UseCase::Translate, UseCase::Sentiment];

    /// Lowercase name used in file names and documents
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Translate => "translate",
            Self::Sentiment => "sentiment",
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UseCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|use_case| use_case.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Which model call an operation makes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Language probe on a text sample
    DetectLanguage,
    /// Summary plus key points
    Summarize,
    /// Translation into a target language
    Translate,
    /// Sentiment label with confidence
    Sentiment,
}

const DETECT_LANGUAGE_TEMPLATE: &str = r#"You are a language detection assistant.
Identify the language of the text provided between <USER_CONTENT> tags.

{isolation_notice}

Respond ONLY with valid JSON in this exact format:
{
    "language": "English"
}

Use the full language name (e.g., "English", "Spanish", "French")."#;

const SUMMARIZE_TEMPLATE: &str = r#"You are a text summarization assistant.
Your task is to analyze the text provided between <USER_CONTENT> tags and create:
1. A concise summary (2-3 sentences)
2. A list of 3-5 key points

{isolation_notice}

Respond ONLY with valid JSON in this exact format:
{
    "summary": "Your summary here",
    "key_points": ["Point 1", "Point 2", "Point 3"]
}"#;

const TRANSLATE_TEMPLATE: &str = r#"You are a professional translator.
Translate the text provided between <USER_CONTENT> tags to {target_language}.
Preserve the original tone, style, and meaning.

{isolation_notice}

Respond ONLY with valid JSON in this exact format:
{
    "translated_text": "Your translation here",
    "target_language": "{target_language}"
}"#;

const SENTIMENT_TEMPLATE: &str = r#"You are a sentiment analysis assistant.
Analyze the sentiment of the text provided between <USER_CONTENT> tags.

{isolation_notice}

Determine:
1. Overall sentiment: "positive", "neutral", or "negative"
2. Confidence score: a number between 0 and 1 (e.g., 0.85)

Respond ONLY with valid JSON in this exact format:
{
    "sentiment": "positive",
    "confidence": 0.85,
    "explanation": "Brief explanation of the sentiment"
}"#;

/// One configured model operation
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    kind: OperationKind,
    instruction: String,
    schema: ResponseSchema,
}

impl Operation {
    fn render(template: &str) -> String {
        template.replace("{isolation_notice}", ISOLATION_NOTICE)
    }

    /// Language probe: `{language}`
    pub fn detect_language() -> Self {
        Self {
            kind: OperationKind::DetectLanguage,
            instruction: Self::render(DETECT_LANGUAGE_TEMPLATE),
            schema: ResponseSchema::new("detect_language").field("language", FieldRule::Text),
        }
    }

    /// Summary: `{summary, key_points[3..=5]}`
    pub fn summarize() -> Self {
        Self {
            kind: OperationKind::Summarize,
            instruction: Self::render(SUMMARIZE_TEMPLATE),
            schema: ResponseSchema::new("summarize")
                .field("summary", FieldRule::Text)
                .field("key_points", FieldRule::List { min: 3, max: 5 }),
        }
    }

    /// Translation: `{translated_text, target_language}`
    pub fn translate(target_language: &str) -> Self {
        Self {
            kind: OperationKind::Translate,
            instruction: Self::render(TRANSLATE_TEMPLATE).replace("{target_language}", target_language),
            schema: ResponseSchema::new("translate")
                .field("translated_text", FieldRule::Text)
                .field("target_language", FieldRule::Text),
        }
    }

    /// Sentiment: `{sentiment, confidence, explanation}`
    pub fn sentiment() -> Self {
        Self {
            kind: OperationKind::Sentiment,
            instruction: Self::render(SENTIMENT_TEMPLATE),
            schema: ResponseSchema::new("sentiment")
                .field("sentiment", FieldRule::OneOf(SENTIMENT_LABELS))
                .field("confidence", FieldRule::UnitInterval)
                .field("explanation", FieldRule::Text),
        }
    }

    /// Operation kind
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Rendered instruction
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Reply schema
    pub fn schema(&self) -> &ResponseSchema {
        &self.schema
    }

    /// Build the call for `text`, isolating it first
    pub fn request(&self, text: &str, response_shape: Option<ResponseShape>) -> CallRequest {
        let request = CallRequest::new(self.instruction.clone(), isolate(text));
        match response_shape {
            Some(shape) => request.with_response_shape(shape),
            None => request,
        }
    }
}

/// The first `max_chars` characters of `text`, never splitting a character
pub fn leading_sample(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Runs operations through a call executor.
#[derive(Debug)]
pub struct ContentAnalyzer {
    executor: CallExecutor,
    detect_sample_chars: usize,
    structured_output: bool,
}

impl ContentAnalyzer {
    /// Create an analyzer with the default sample size and JSON output hint
    pub fn new(executor: CallExecutor) -> Self {
        Self {
            executor,
            detect_sample_chars: DETECT_SAMPLE_CHARS,
            structured_output: true,
        }
    }

    /// Set how many characters the language probe sees
    pub fn with_detect_sample_chars(mut self, chars: usize) -> Self {
        self.detect_sample_chars = chars;
        self
    }

    /// Enable or disable the JSON object output hint
    pub fn with_structured_output(mut self, enabled: bool) -> Self {
        self.structured_output = enabled;
        self
    }

    /// Run `operation` on `text` and validate the reply
    pub async fn run(&self, operation: &Operation, text: &str) -> Result<ValidatedResult, ApiError> {
        let shape = self.structured_output.then_some(ResponseShape::JsonObject);
        let request = operation.request(text, shape);

        debug!("Running {} on {} characters", operation.schema().name(), text.chars().count());
        let payload = self.executor.execute(&request).await?;
        Ok(validate(&payload, operation.schema())?)
    }

    /// Detect the language of `text` from its leading sample
    pub async fn detect_language(&self, text: &str) -> Result<String, ApiError> {
        let sample = leading_sample(text, self.detect_sample_chars);
        let result = self.run(&Operation::detect_language(), sample).await?;
        let language = result.get_str("language").unwrap_or_default().to_string();
        info!("Detected language: {}", language);
        Ok(language)
    }

    /// Summarize `text`
    pub async fn summarize(&self, text: &str) -> Result<ValidatedResult, ApiError> {
        self.run(&Operation::summarize(), text).await
    }

    /// Translate `text` into `target_language`
    pub async fn translate(&self, text: &str, target_language: &str) -> Result<ValidatedResult, ApiError> {
        self.run(&Operation::translate(target_language), text).await
    }

    /// Analyze the sentiment of `text`
    pub async fn analyze_sentiment(&self, text: &str) -> Result<ValidatedResult, ApiError> {
        self.run(&Operation::sentiment(), text).await
    }
}
