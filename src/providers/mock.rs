/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates endpoint behaviors:
 * - `MockProvider::working(payload)` - Always answers with the same payload
 * - `MockProvider::failing()` - Always fails with an API error
 * - `MockProvider::empty()` - Always answers with an empty payload
 * - `MockProvider::scripted(replies)` - Answers with each reply in turn
 * - `MockProvider::routed(responder)` - Picks a reply from the request
 *
 * Clones share the request counter and the request log, so a test can hand a
 * clone to the executor and inspect the original afterwards.
 */

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::ProviderError;
use crate::executor::{CallRequest, ResponseShape};
use crate::providers::Provider;

/// A request as the mock received it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Instruction channel
    pub instruction: String,
    /// Content channel, markers included
    pub content: String,
    /// Structured output hint
    pub response_shape: Option<ResponseShape>,
}

/// One simulated endpoint reply
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Successful payload
    Payload(String),
    /// Transport or endpoint failure
    Failure(ProviderError),
    /// Successful call with no content
    Empty,
}

/// Chooses a reply from the incoming request
pub type Responder = fn(&RecordedRequest) -> MockReply;

/// Mock provider for testing call behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Replies consumed before the fallback applies
    script: Arc<Mutex<VecDeque<MockReply>>>,
    /// Reply used once the script is exhausted
    fallback: MockReply,
    /// Optional request-dependent reply, consulted before the fallback
    responder: Option<Responder>,
    /// Number of calls received
    request_count: Arc<AtomicUsize>,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockProvider {
    /// Create a mock that always gives `fallback`
    pub fn new(fallback: MockReply) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback,
            responder: None,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock that always answers with `payload`
    pub fn working(payload: impl Into<String>) -> Self {
        Self::new(MockReply::Payload(payload.into()))
    }

    /// Create a failing mock that always errors
    pub fn failing() -> Self {
        Self::new(MockReply::Failure(ProviderError::ApiError {
            status_code: 500,
            message: "Simulated provider failure".to_string(),
        }))
    }

    /// Create a mock that returns empty payloads
    pub fn empty() -> Self {
        Self::new(MockReply::Empty)
    }

    /// Create a mock that plays `replies` in order, then keeps failing
    pub fn scripted(replies: Vec<MockReply>) -> Self {
        let provider = Self::failing();
        lock(&provider.script).extend(replies);
        provider
    }

    /// Create a mock whose replies depend on the request
    pub fn routed(responder: Responder) -> Self {
        Self::failing().with_responder(responder)
    }

    /// Set a request-dependent reply generator
    pub fn with_responder(mut self, responder: Responder) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Number of calls received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: &CallRequest) -> Result<String, ProviderError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);

        let recorded = RecordedRequest {
            instruction: request.instruction().to_string(),
            content: request.content().as_str().to_string(),
            response_shape: request.response_shape(),
        };
        lock(&self.requests).push(recorded.clone());

        let scripted = lock(&self.script).pop_front();
        let reply = match (scripted, self.responder) {
            (Some(reply), _) => reply,
            (None, Some(responder)) => responder(&recorded),
            (None, None) => self.fallback.clone(),
        };

        match reply {
            MockReply::Payload(text) => Ok(text),
            MockReply::Failure(error) => Err(error),
            MockReply::Empty => Ok(String::new()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
