//! OpenAI-compatible chat-completions client.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TextTransform;
use crate::config::ResolvedConfig;
use crate::{Error, Result};

const USER_AGENT: &str = concat!("socratic/", env!("CARGO_PKG_VERSION"));

/// Blocking client for `<base_url>/chat/completions`.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatCompletionClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    /// Build a client from resolved configuration and the process environment.
    pub fn from_config(config: &ResolvedConfig) -> Self {
        let (base_url, api_key) = config.completion_endpoint(|key| std::env::var(key).ok());
        Self::new(base_url, api_key, config.llm.model.clone())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl TextTransform for ChatCompletionClient {
    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(Error::Llm(format!(
                "no API key configured for {}",
                self.base_url
            )));
        };

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        debug!(endpoint = %self.endpoint(), model = %self.model, "LLM request");
        let response = ureq::post(&self.endpoint())
            .set("Authorization", &format!("Bearer {}", api_key))
            .set("Content-Type", "application/json")
            .set("User-Agent", USER_AGENT)
            .send_json(&request);

        let response: ChatCompletionResponse = match response {
            Ok(resp) => resp
                .into_json()
                .map_err(|e| Error::Llm(format!("invalid response body: {}", e)))?,
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                return Err(Error::Llm(format!("HTTP {}: {}", code, body)));
            }
            Err(e) => return Err(Error::Llm(e.to_string())),
        };

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Llm("response contained no message content".to_string()))
    }
}
