//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, TextGenerator};
use crate::config::BackendConfig;

/// Client for any `/chat/completions` endpoint that speaks the OpenAI wire
/// format. The default deployment points this at a local model server, in
/// which case no API key is configured.
pub struct OpenAiCompatBackend {
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiCompatBackend {
    pub fn new(cfg: &BackendConfig) -> Self {
        Self {
            base_url: cfg.base_url.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
            client: reqwest::Client::new(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatBackend {
    async fn invoke(&self, prompt: &str) -> Result<String, BackendError> {
        let endpoint = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        let mut request = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;

        tracing::debug!(%status, model = %self.model, "chat completions response");

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(BackendError::Auth(format!(
                "backend auth failed ({status}); check API key"
            )));
        }
        if !status.is_success() {
            return Err(BackendError::Request(format!("backend error {status}: {text}")));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| BackendError::InvalidResponse(format!("parse failed: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                BackendError::InvalidResponse("missing choices[0].message.content".to_string())
            })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn backend_for(server: &MockServer) -> OpenAiCompatBackend {
        OpenAiCompatBackend::new(&BackendConfig {
            base_url: server.url("/v1"),
            model: "test-model".to_string(),
            api_key: None,
            max_tokens: 64,
            temperature: 0.0,
        })
    }

    #[tokio::test]
    async fn returns_message_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": "hello"}}]
                }));
            })
            .await;

        let out = backend_for(&server).invoke("hi").await.unwrap();
        assert_eq!(out, "hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn maps_auth_failures() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(401).body("unauthorized");
            })
            .await;

        let err = backend_for(&server).invoke("hi").await.unwrap_err();
        assert!(matches!(err, BackendError::Auth(_)));
    }

    #[tokio::test]
    async fn rejects_malformed_payload() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).body("not json");
            })
            .await;

        let err = backend_for(&server).invoke("hi").await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn empty_choices_is_invalid() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(serde_json::json!({"choices": []}));
            })
            .await;

        let err = backend_for(&server).invoke("hi").await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }
}
