use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::app_config::Credential;
use crate::errors::ProviderError;
use crate::executor::{CallRequest, ResponseShape};
use crate::providers::Provider;

/// OpenAI client for the chat completions API
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Model identifier
    model: String,
    /// API base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
}

impl std::fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAI")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Chat completions request
#[derive(Debug, Serialize, Default)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Structured output format
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// `response_format` body field
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResponseFormat {
    /// Format name, e.g. `json_object`
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u32,
    /// Number of completion tokens
    pub completion_tokens: u32,
    /// Total number of tokens
    pub total_tokens: u32,
}

/// Chat completions response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Generated choices
    pub choices: Vec<OpenAIChoice>,
    /// Token usage information
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// One generated choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    /// Assistant message
    pub message: OpenAIChoiceMessage,
}

/// Assistant message inside a choice; content may be null
#[derive(Debug, Deserialize)]
pub struct OpenAIChoiceMessage {
    /// Message text
    #[serde(default)]
    pub content: Option<String>,
}

impl OpenAIRequest {
    /// Create a new request for `model`
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Request a structured output shape
    pub fn response_format(mut self, shape: ResponseShape) -> Self {
        self.response_format = Some(ResponseFormat {
            format_type: shape.as_str().to_string(),
        });
        self
    }

    /// Messages in send order
    pub fn messages(&self) -> &[OpenAIMessage] {
        &self.messages
    }

    /// Build the two-message request for a call: system instruction, then user content
    pub fn from_call(model: impl Into<String>, call: &CallRequest) -> Self {
        let request = Self::new(model)
            .add_message("system", call.instruction())
            .add_message("user", call.content().as_str());
        match call.response_shape() {
            Some(shape) => request.response_format(shape),
            None => request,
        }
    }
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(credential: &Credential, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: credential.api_key().to_string(),
            model: credential.model().to_string(),
            endpoint: endpoint.into(),
        }
    }

    /// Chat completions URL for the configured endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    /// Send a chat completions request once
    pub async fn chat(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else if e.is_connect() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::AuthenticationError(error_text)
                }
                StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(error_text),
                _ => ProviderError::ApiError {
                    status_code: status.as_u16(),
                    message: error_text,
                },
            });
        }

        let openai_response = response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(usage) = &openai_response.usage {
            debug!(
                "OpenAI usage: {} prompt + {} completion = {} tokens",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(openai_response)
    }

    /// Extract the text of the first choice
    pub fn extract_text_from_response(response: &OpenAIResponse) -> Option<String> {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(&self, request: &CallRequest) -> Result<String, ProviderError> {
        let body = OpenAIRequest::from_call(&self.model, request);
        let response = self.chat(&body).await?;
        Self::extract_text_from_response(&response).ok_or(ProviderError::EmptyResponse)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
