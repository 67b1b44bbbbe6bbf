use crate::config::LlmConfig;
use crate::error::AgentError;
use crate::prompt::SYSTEM_PROMPT;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

/// Something that turns a prompt into a completion
pub trait CompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError>;
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<Message>,
    model: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completion client
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    retry: RetryPolicy,
}

impl ChatClient {
    pub fn new(config: &LlmConfig, api_key: &str, retry: RetryPolicy) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            retry,
        })
    }

    async fn send(&self, prompt: &str) -> Result<String, AgentError> {
        let request = ChatRequest {
            messages: build_messages(prompt),
            model: &self.model,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!("Response received from model: status {}", status);

        if !status.is_success() {
            return Err(AgentError::Unexpected {
                status: status.as_u16(),
                body: error_payload(&text),
            });
        }

        parse_completion(&text)
    }
}

impl CompletionProvider for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<String, AgentError> {
        debug!("Sending request to model: {}", self.model);
        trace!("Prompt: {}", prompt);
        let content = self.retry.run("Model request", || self.send(prompt)).await?;
        trace!("Model output: {}", content);
        Ok(content)
    }
}

fn build_messages(prompt: &str) -> Vec<Message> {
    vec![
        Message::new("system", SYSTEM_PROMPT),
        Message::new("user", prompt),
    ]
}

/// Extract the first choice's content from a successful response body
fn parse_completion(body: &str) -> Result<String, AgentError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    // First choice is the primary response
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::MalformedResponse("response has no choices".into()))?;

    choice
        .message
        .content
        .ok_or_else(|| AgentError::MalformedResponse("first choice has no content".into()))
}

/// The `error` object of an error response, or the raw body
fn error_payload(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned())
        .map(|error| error.to_string())
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serve_once;

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            messages: build_messages("fix it"),
            model: "openai/gpt-4.1",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "openai/gpt-4.1");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "You are a helpful assistant.");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "fix it");
    }

    #[test]
    fn test_parse_completion_first_choice() {
        let body = r#"{"choices": [
            {"index": 0, "message": {"role": "assistant", "content": "package cache"}},
            {"index": 1, "message": {"role": "assistant", "content": "other"}}
        ]}"#;
        assert_eq!(parse_completion(body).unwrap(), "package cache");
    }

    #[test]
    fn test_parse_completion_without_choices() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, AgentError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_completion_null_content() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        assert!(matches!(
            parse_completion(body),
            Err(AgentError::MalformedResponse(_))
        ));
    }

    fn client_for(url: &str) -> ChatClient {
        let config = LlmConfig {
            base_url: url.into(),
            model: "openai/gpt-4.1".into(),
            timeout_secs: Some(10),
        };
        ChatClient::new(&config, "gh-token", RetryPolicy::default()).unwrap()
    }

    #[tokio::test]
    async fn test_complete_posts_chat_request() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "fixed file"}}]}"#;
        let (url, server) = serve_once("200 OK", body).await;
        let content = client_for(&url).complete("fix it").await.unwrap();
        assert_eq!(content, "fixed file");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /chat/completions "));
        assert!(request.to_lowercase().contains("authorization: bearer gh-token"));
        assert!(request.contains(r#""model":"openai/gpt-4.1""#));
    }

    #[tokio::test]
    async fn test_complete_error_response() {
        let body = r#"{"error": {"code": "RateLimitReached", "message": "slow down"}}"#;
        let (url, server) = serve_once("429 Too Many Requests", body).await;
        let err = client_for(&url).complete("fix it").await.unwrap_err();
        match err {
            AgentError::Unexpected { status, body } => {
                assert_eq!(status, 429);
                assert!(body.contains("RateLimitReached"));
            }
            other => panic!("unexpected error: {}", other),
        }
        server.await.unwrap();
    }

    #[test]
    fn test_error_payload_extracts_error_object() {
        let body = r#"{"error": {"code": "unauthorized", "message": "Bad credentials"}}"#;
        let payload = error_payload(body);
        assert!(payload.contains("unauthorized"));
        assert!(payload.contains("Bad credentials"));
        assert_eq!(error_payload("gateway timeout"), "gateway timeout");
    }
}
