/*!
 * Resilient call executor.
 *
 * Sends one instruction and one protected content blob to the model endpoint
 * with a bounded number of attempts. Attempt `i` (0-based) is preceded by a
 * pause of `base_delay * i`, so with the defaults the waits are 2s then 4s.
 * A session ends on the first non-empty payload or after the last attempt,
 * in which case only the last failure cause is reported.
 *
 * The session is an explicit state machine (`CallSession`) so that each
 * attempt, its outcome and the delay that preceded it can be inspected.
 */

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};

use crate::errors::{CallError, ProviderError};
use crate::isolation::ProtectedContent;
use crate::providers::Provider;

/// Attempts per call session
pub const MAX_RETRIES: u32 = 3;

/// Base delay between attempts, multiplied by the attempt index
pub const RETRY_DELAY_SECONDS: u64 = 2;

/// Structured output hint forwarded to the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// The reply must be a single JSON object
    JsonObject,
}

impl ResponseShape {
    /// Wire name of the shape
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JsonObject => "json_object",
        }
    }
}

/// One instruction plus one protected content blob.
///
/// The two travel on separate channels and are never concatenated.
#[derive(Debug)]
pub struct CallRequest {
    instruction: String,
    content: ProtectedContent,
    response_shape: Option<ResponseShape>,
}

impl CallRequest {
    /// Create a request without a response shape hint
    pub fn new(instruction: impl Into<String>, content: ProtectedContent) -> Self {
        Self {
            instruction: instruction.into(),
            content,
            response_shape: None,
        }
    }

    /// Declare the expected response shape
    pub fn with_response_shape(mut self, shape: ResponseShape) -> Self {
        self.response_shape = Some(shape);
        self
    }

    /// System-level directive
    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Wrapped user content
    pub fn content(&self) -> &ProtectedContent {
        &self.content
    }

    /// Requested response shape, if any
    pub fn response_shape(&self) -> Option<ResponseShape> {
        self.response_shape
    }
}

/// Attempt budget and backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_RETRIES,
            base_delay: Duration::from_secs(RETRY_DELAY_SECONDS),
        }
    }
}

impl RetryPolicy {
    /// Create a policy; at least one attempt is always made
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Number of attempts in a session
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Base delay
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Pause before the attempt with the given 0-based index
    pub fn delay_before(&self, attempt_index: u32) -> Duration {
        self.base_delay * attempt_index
    }
}

/// What one attempt produced
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Non-empty payload; the session ends
    Success(String),
    /// Failure with attempts remaining
    TransientFailure(ProviderError),
    /// Failure on the last permitted attempt; the session ends
    Fatal(ProviderError),
}

/// One entry of a call session
#[derive(Debug, Clone, PartialEq)]
pub struct CallAttempt {
    /// 0-based attempt index
    pub attempt_index: u32,
    /// Pause taken before this attempt
    pub delay_before: Duration,
    /// Result of the attempt
    pub outcome: AttemptOutcome,
}

/// The sequence of attempts for one call.
#[derive(Debug, Clone)]
pub struct CallSession {
    policy: RetryPolicy,
    attempts: Vec<CallAttempt>,
}

impl CallSession {
    /// Start an empty session
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: Vec::with_capacity(policy.max_attempts() as usize),
        }
    }

    /// Index of the next attempt, or `None` once the session has terminated
    pub fn next_attempt(&self) -> Option<u32> {
        if self.is_terminated() {
            None
        } else {
            Some(self.attempts.len() as u32)
        }
    }

    /// Whether the session reached success or ran out of attempts
    pub fn is_terminated(&self) -> bool {
        match self.attempts.last() {
            Some(attempt) => !matches!(attempt.outcome, AttemptOutcome::TransientFailure(_)),
            None => false,
        }
    }

    /// Record the result of the next attempt and return its classified outcome
    pub fn record(&mut self, result: Result<String, ProviderError>) -> &AttemptOutcome {
        let attempt_index = self.attempts.len() as u32;
        let is_last = attempt_index + 1 >= self.policy.max_attempts();

        let outcome = match result {
            Ok(payload) if !payload.trim().is_empty() => AttemptOutcome::Success(payload),
            Ok(_) if is_last => AttemptOutcome::Fatal(ProviderError::EmptyResponse),
            Ok(_) => AttemptOutcome::TransientFailure(ProviderError::EmptyResponse),
            Err(cause) if is_last => AttemptOutcome::Fatal(cause),
            Err(cause) => AttemptOutcome::TransientFailure(cause),
        };

        self.attempts.push(CallAttempt {
            attempt_index,
            delay_before: self.policy.delay_before(attempt_index),
            outcome,
        });
        &self.attempts[attempt_index as usize].outcome
    }

    /// Attempts made so far, in order
    pub fn attempts(&self) -> &[CallAttempt] {
        &self.attempts
    }

    /// Payload of the successful attempt, or the last failure as a `CallError`
    pub fn into_result(mut self) -> Result<String, CallError> {
        let attempts = self.attempts.len() as u32;
        match self.attempts.pop().map(|attempt| attempt.outcome) {
            Some(AttemptOutcome::Success(payload)) => Ok(payload),
            Some(AttemptOutcome::Fatal(cause)) | Some(AttemptOutcome::TransientFailure(cause)) => {
                Err(CallError { attempts, cause })
            }
            None => Err(CallError {
                attempts,
                cause: ProviderError::RequestFailed("no attempt was made".to_string()),
            }),
        }
    }
}

/// Suspends the caller between attempts
#[async_trait]
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    /// Pause for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that records requested pauses and returns immediately
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Pauses requested so far
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(duration);
    }
}

/// Issues calls to a provider under a retry policy.
#[derive(Debug)]
pub struct CallExecutor {
    provider: Box<dyn Provider>,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl CallExecutor {
    /// Create an executor that sleeps on the tokio timer
    pub fn new(provider: impl Provider + 'static, policy: RetryPolicy) -> Self {
        Self {
            provider: Box::new(provider),
            policy,
            sleeper: Box::new(TokioSleeper),
        }
    }

    /// Replace the sleeper
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Retry policy in force
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run a full session and return its payload
    pub async fn execute(&self, request: &CallRequest) -> Result<String, CallError> {
        self.execute_session(request).await.into_result()
    }

    /// Run a full session and return it for inspection
    pub async fn execute_session(&self, request: &CallRequest) -> CallSession {
        let mut session = CallSession::new(self.policy);
        let max_attempts = self.policy.max_attempts();

        while let Some(attempt_index) = session.next_attempt() {
            let delay = self.policy.delay_before(attempt_index);
            if !delay.is_zero() {
                debug!(
                    "Waiting {:?} before attempt {}/{}",
                    delay,
                    attempt_index + 1,
                    max_attempts
                );
                self.sleeper.sleep(delay).await;
            }

            debug!(
                "Calling {} (attempt {}/{})",
                self.provider.name(),
                attempt_index + 1,
                max_attempts
            );
            let result = self.provider.complete(request).await;

            match session.record(result) {
                AttemptOutcome::Success(_) => {
                    if attempt_index > 0 {
                        debug!("{} call succeeded on retry {}", self.provider.name(), attempt_index);
                    }
                }
                AttemptOutcome::TransientFailure(cause) => {
                    warn!(
                        "{} call failed: {} - attempt {}/{}",
                        self.provider.name(),
                        cause,
                        attempt_index + 1,
                        max_attempts
                    );
                }
                AttemptOutcome::Fatal(cause) => {
                    error!(
                        "{} call failed after {} attempts: {}",
                        self.provider.name(),
                        max_attempts,
                        cause
                    );
                }
            }
        }

        session
    }
}
