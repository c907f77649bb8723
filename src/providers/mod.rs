/*!
 * Provider implementations for the model endpoint.
 *
 * This module contains client implementations behind a single trait:
 * - OpenAI: chat completions API over HTTPS
 * - Mock: scripted provider for tests and offline runs
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::executor::CallRequest;

/// Common trait for all model endpoints
///
/// One call carries one instruction and one protected content blob, and
/// yields one text payload or a transport error. Retries are not the
/// provider's concern; the call executor owns them.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Send the request once and return the raw payload
    ///
    /// # Arguments
    /// * `request` - Instruction, protected content and optional response shape
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The payload text or the failure cause
    async fn complete(&self, request: &CallRequest) -> Result<String, ProviderError>;

    /// Short provider name for log lines
    fn name(&self) -> &'static str;
}

pub mod openai;
pub mod mock;
