/*!
 * Tests for the call executor and its retry behavior
 */

use std::time::Duration;

use aicm::errors::{ApiError, ProviderError, ValidationError};
use aicm::executor::{AttemptOutcome, CallExecutor, CallRequest, RecordingSleeper, ResponseShape, RetryPolicy};
use aicm::isolation::{CONTENT_START_MARKER, isolate};
use aicm::operations::ContentAnalyzer;
use aicm::providers::mock::{MockProvider, MockReply};

fn executor(provider: &MockProvider, sleeper: &RecordingSleeper) -> CallExecutor {
    CallExecutor::new(provider.clone(), RetryPolicy::default()).with_sleeper(sleeper.clone())
}

fn request() -> CallRequest {
    CallRequest::new("Summarize.", isolate("Some text")).with_response_shape(ResponseShape::JsonObject)
}

#[tokio::test]
async fn test_execute_withImmediateSuccess_shouldNotSleep() {
    let provider = MockProvider::working(r#"{"ok": true}"#);
    let sleeper = RecordingSleeper::new();

    let payload = executor(&provider, &sleeper).execute(&request()).await.unwrap();

    assert_eq!(payload, r#"{"ok": true}"#);
    assert_eq!(provider.request_count(), 1);
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_execute_withTwoFailures_shouldSucceedOnThirdAttempt() {
    let provider = MockProvider::scripted(vec![
        MockReply::Failure(ProviderError::RateLimitExceeded("slow down".into())),
        MockReply::Empty,
        MockReply::Payload("{}".into()),
    ]);
    let sleeper = RecordingSleeper::new();

    let payload = executor(&provider, &sleeper).execute(&request()).await.unwrap();

    assert_eq!(payload, "{}");
    assert_eq!(provider.request_count(), 3);
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(2), Duration::from_secs(4)]);
}

#[tokio::test]
async fn test_execute_withPersistentFailure_shouldStopAfterMaxAttempts() {
    let provider = MockProvider::failing();
    let sleeper = RecordingSleeper::new();

    let error = executor(&provider, &sleeper).execute(&request()).await.unwrap_err();

    assert_eq!(error.attempts, 3);
    assert!(matches!(error.cause, ProviderError::ApiError { status_code: 500, .. }));
    assert_eq!(provider.request_count(), 3);
}

#[tokio::test]
async fn test_executeSession_shouldClassifyEveryAttempt() {
    let provider = MockProvider::failing();
    let sleeper = RecordingSleeper::new();

    let session = executor(&provider, &sleeper).execute_session(&request()).await;
    let attempts = session.attempts();

    assert_eq!(attempts.len(), 3);
    assert!(matches!(attempts[0].outcome, AttemptOutcome::TransientFailure(_)));
    assert!(matches!(attempts[1].outcome, AttemptOutcome::TransientFailure(_)));
    assert!(matches!(attempts[2].outcome, AttemptOutcome::Fatal(_)));
    assert_eq!(attempts[2].delay_before, Duration::from_secs(4));
}

#[tokio::test]
async fn test_execute_withCustomPolicy_shouldHonorAttemptBudget() {
    let provider = MockProvider::empty();
    let executor = CallExecutor::new(provider.clone(), RetryPolicy::new(5, Duration::from_millis(10)))
        .with_sleeper(RecordingSleeper::new());

    let error = executor.execute(&request()).await.unwrap_err();

    assert_eq!(error.attempts, 5);
    assert_eq!(error.cause, ProviderError::EmptyResponse);
}

#[tokio::test]
async fn test_execute_shouldSendContentInsideMarkers() {
    let provider = MockProvider::working("{}");
    let sleeper = RecordingSleeper::new();

    executor(&provider, &sleeper).execute(&request()).await.unwrap();

    let recorded = &provider.requests()[0];
    assert_eq!(recorded.instruction, "Summarize.");
    assert!(recorded.content.starts_with(CONTENT_START_MARKER));
    assert!(!recorded.instruction.contains("Some text"));
    assert_eq!(recorded.response_shape, Some(ResponseShape::JsonObject));
}

#[tokio::test]
async fn test_analyzer_withInvalidReply_shouldNotRetry() {
    let provider = MockProvider::working("not json at all");
    let analyzer = ContentAnalyzer::new(
        CallExecutor::new(provider.clone(), RetryPolicy::default()).with_sleeper(RecordingSleeper::new()),
    );

    let error = analyzer.summarize("Some text").await.unwrap_err();

    assert!(matches!(error, ApiError::Validation(ValidationError::InvalidJson(_))));
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_analyzer_withStructuredOutputDisabled_shouldOmitHint() {
    let provider = MockProvider::working(r#"{"language": "French"}"#);
    let analyzer = ContentAnalyzer::new(
        CallExecutor::new(provider.clone(), RetryPolicy::default()).with_sleeper(RecordingSleeper::new()),
    )
    .with_structured_output(false);

    let language = analyzer.detect_language("Bonjour tout le monde").await.unwrap();

    assert_eq!(language, "French");
    assert_eq!(provider.requests()[0].response_shape, None);
}

#[tokio::test]
async fn test_analyzer_detectLanguage_shouldSendOnlyLeadingSample() {
    let provider = MockProvider::working(r#"{"language": "English"}"#);
    let analyzer = ContentAnalyzer::new(
        CallExecutor::new(provider.clone(), RetryPolicy::default()).with_sleeper(RecordingSleeper::new()),
    )
    .with_detect_sample_chars(10);
    let text = "é".repeat(40);

    analyzer.detect_language(&text).await.unwrap();

    let content = provider.requests()[0].content.clone();
    assert!(content.contains(&"é".repeat(10)));
    assert!(!content.contains(&"é".repeat(11)));
}
