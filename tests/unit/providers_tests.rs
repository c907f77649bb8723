/*!
 * Tests for provider implementations
 */

use std::time::Duration;

use anyhow::Result;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use aicm::app_config::Credential;
use aicm::errors::ProviderError;
use aicm::executor::{CallRequest, ResponseShape};
use aicm::isolation::isolate;
use aicm::providers::Provider;
use aicm::providers::mock::{MockProvider, MockReply};
use aicm::providers::openai::{OpenAI, OpenAIRequest, OpenAIResponse};

fn call(shape: Option<ResponseShape>) -> CallRequest {
    let request = CallRequest::new("Detect the language.", isolate("Hallo Welt"));
    match shape {
        Some(shape) => request.with_response_shape(shape),
        None => request,
    }
}

/// Answers exactly one HTTP request with `status` and `body`, returning the endpoint to call
async fn serve_once(status: &'static str, body: &'static str) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let address = listener.local_addr()?;
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });
    Ok(format!("http://{}/v1", address))
}

/// Consumes the request headers and the body announced by Content-Length
async fn read_request(socket: &mut TcpStream) {
    let mut received = Vec::new();
    let mut buffer = [0u8; 4096];
    loop {
        match socket.read(&mut buffer).await {
            Ok(0) | Err(_) => return,
            Ok(n) => received.extend_from_slice(&buffer[..n]),
        }
        if let Some(end) = received.windows(4).position(|window| window == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&received[..end]).to_ascii_lowercase();
            let length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if received.len() >= end + 4 + length {
                return;
            }
        }
    }
}

fn local_provider(endpoint: &str) -> OpenAI {
    OpenAI::new(&Credential::new("sk-test", "gpt-4o"), endpoint, Duration::from_secs(5))
}

#[test]
fn test_openaiRequest_fromCall_shouldUseSeparateChannels() -> Result<()> {
    let request = OpenAIRequest::from_call("gpt-4o", &call(Some(ResponseShape::JsonObject)));
    let body: Value = serde_json::to_value(&request)?;

    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "Detect the language.");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "<USER_CONTENT>\nHallo Welt\n</USER_CONTENT>");
    assert_eq!(body["response_format"], json!({"type": "json_object"}));
    Ok(())
}

#[test]
fn test_openaiRequest_withoutOptions_shouldSkipNullFields() -> Result<()> {
    let request = OpenAIRequest::from_call("gpt-4o", &call(None));
    let body: Value = serde_json::to_value(&request)?;

    assert!(body.get("response_format").is_none());
    let keys: Vec<&str> = body
        .as_object()
        .map(|object| object.keys().map(String::as_str).collect())
        .unwrap_or_default();
    assert_eq!(keys, vec!["messages", "model"]);
    Ok(())
}

#[test]
fn test_openaiResponse_withNullContent_shouldExtractNothing() -> Result<()> {
    let response: OpenAIResponse = serde_json::from_value(json!({
        "choices": [{"message": {"role": "assistant", "content": null}}]
    }))?;
    assert_eq!(OpenAI::extract_text_from_response(&response), None);

    let response: OpenAIResponse = serde_json::from_value(json!({"choices": []}))?;
    assert_eq!(OpenAI::extract_text_from_response(&response), None);
    Ok(())
}

#[test]
fn test_openaiResponse_withUsage_shouldExtractFirstChoice() -> Result<()> {
    let response: OpenAIResponse = serde_json::from_value(json!({
        "choices": [
            {"message": {"role": "assistant", "content": "{\"language\": \"German\"}"}},
            {"message": {"role": "assistant", "content": "ignored"}}
        ],
        "usage": {"prompt_tokens": 30, "completion_tokens": 8, "total_tokens": 38}
    }))?;

    assert_eq!(
        OpenAI::extract_text_from_response(&response).as_deref(),
        Some("{\"language\": \"German\"}")
    );
    assert_eq!(response.usage.map(|usage| usage.total_tokens), Some(38));
    Ok(())
}

#[test]
fn test_openai_completionsUrl_shouldJoinWithoutDoubleSlash() {
    let credential = Credential::new("sk-test", "gpt-4o");
    let provider = OpenAI::new(&credential, "http://localhost:8080/v1/", Duration::from_secs(1));
    assert_eq!(provider.completions_url(), "http://localhost:8080/v1/chat/completions");
    assert!(!format!("{:?}", provider).contains("sk-test"));
}

#[tokio::test]
async fn test_openai_withUnreachableEndpoint_shouldFailWithTransportError() {
    let credential = Credential::new("sk-test", "gpt-4o");
    let provider = OpenAI::new(&credential, "http://127.0.0.1:9/v1", Duration::from_secs(2));

    let error = provider.complete(&call(None)).await.unwrap_err();

    assert!(matches!(
        error,
        ProviderError::ConnectionError(_) | ProviderError::RequestFailed(_) | ProviderError::Timeout(_)
    ));
}

#[tokio::test]
async fn test_mockProvider_scripted_shouldFailOnceExhausted() {
    let provider = MockProvider::scripted(vec![MockReply::Payload("{}".into())]);

    assert_eq!(provider.complete(&call(None)).await, Ok("{}".to_string()));
    assert!(provider.complete(&call(None)).await.is_err());
    assert_eq!(provider.request_count(), 2);
}

#[tokio::test]
async fn test_mockProvider_clones_shouldShareRequestLog() {
    let provider = MockProvider::working("{}");
    let clone = provider.clone();

    clone.complete(&call(Some(ResponseShape::JsonObject))).await.unwrap();

    assert_eq!(provider.request_count(), 1);
    assert_eq!(provider.requests()[0].response_shape, Some(ResponseShape::JsonObject));
    assert_eq!(provider.name(), "mock");
}

#[tokio::test]
async fn test_openai_withUnauthorizedOrForbidden_shouldBeAuthenticationError() -> Result<()> {
    for status in ["401 Unauthorized", "403 Forbidden"] {
        let endpoint = serve_once(status, r#"{"error": {"message": "bad key"}}"#).await?;

        let error = local_provider(&endpoint).complete(&call(None)).await.unwrap_err();

        match error {
            ProviderError::AuthenticationError(body) => assert!(body.contains("bad key"), "{}", body),
            other => panic!("{}: expected AuthenticationError, got {:?}", status, other),
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_openai_withTooManyRequests_shouldBeRateLimitExceeded() -> Result<()> {
    let endpoint = serve_once("429 Too Many Requests", r#"{"error": {"message": "slow down"}}"#).await?;

    let error = local_provider(&endpoint).complete(&call(None)).await.unwrap_err();

    assert!(matches!(error, ProviderError::RateLimitExceeded(body) if body.contains("slow down")));
    Ok(())
}

#[tokio::test]
async fn test_openai_withServiceUnavailable_shouldKeepStatusCode() -> Result<()> {
    let endpoint = serve_once("503 Service Unavailable", r#"{"error": "overloaded"}"#).await?;

    let error = local_provider(&endpoint).complete(&call(None)).await.unwrap_err();

    match error {
        ProviderError::ApiError { status_code, message } => {
            assert_eq!(status_code, 503);
            assert!(message.contains("overloaded"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_openai_withSuccessfulReply_shouldReturnMessageContent() -> Result<()> {
    let endpoint = serve_once(
        "200 OK",
        r#"{"choices":[{"message":{"role":"assistant","content":"{\"language\":\"English\"}"}}]}"#,
    )
    .await?;

    let text = local_provider(&endpoint).complete(&call(Some(ResponseShape::JsonObject))).await;

    assert_eq!(text, Ok(r#"{"language":"English"}"#.to_string()));
    Ok(())
}

#[tokio::test]
async fn test_openai_withNonJsonReply_shouldBeParseError() -> Result<()> {
    let endpoint = serve_once("200 OK", "not json").await?;

    let error = local_provider(&endpoint).complete(&call(None)).await.unwrap_err();

    assert!(matches!(error, ProviderError::ParseError(_)));
    Ok(())
}

#[tokio::test]
async fn test_openai_withNullContent_shouldBeEmptyResponse() -> Result<()> {
    let endpoint = serve_once("200 OK", r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#).await?;

    let error = local_provider(&endpoint).complete(&call(None)).await.unwrap_err();

    assert!(matches!(error, ProviderError::EmptyResponse));
    Ok(())
}
