use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::llm::{CompletionRequest, CompletionTransport};
use crate::error::ClassifierError;

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

/// OpenAI-compatible chat-completions transport.
#[derive(Clone)]
pub struct HttpCompletionTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl std::fmt::Debug for HttpCompletionTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCompletionTransport")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpCompletionTransport {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Build a transport whose API key is read from `api_key_env`.
    pub fn from_env(
        endpoint: impl Into<String>,
        api_key_env: &str,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let api_key = std::env::var(api_key_env).map_err(|_| {
            ClassifierError::InvalidConfig(format!("missing {}", api_key_env))
        })?;
        Self::new(endpoint, api_key, timeout)
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

#[async_trait]
impl CompletionTransport for HttpCompletionTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClassifierError> {
        let body = ChatRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Unavailable(format!("request timed out: {}", e))
                } else {
                    ClassifierError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Unavailable(format!(
                "completion endpoint returned {}",
                status
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Transport(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ClassifierError::Transport("completion had no choices".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let transport =
            HttpCompletionTransport::new("http://localhost:9/v1/", "key", Duration::from_secs(1))
                .unwrap();
        assert_eq!(transport.url(), "http://localhost:9/v1/chat/completions");
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let err = HttpCompletionTransport::from_env(
            DEFAULT_ENDPOINT,
            "AGEGATE_TEST_KEY_THAT_IS_NEVER_SET",
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidConfig(_)));
    }

    #[test]
    fn response_parsing_takes_first_choice() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"MINOR"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content, "MINOR");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let transport =
            HttpCompletionTransport::new("http://127.0.0.1:9", "key", Duration::from_millis(200))
                .unwrap();
        let request = CompletionRequest {
            model: "m".into(),
            prompt: "p".into(),
            max_tokens: 1,
        };
        assert!(transport.complete(&request).await.is_err());
    }
}
