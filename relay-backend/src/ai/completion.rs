//! Single-turn chat completions against an OpenAI-compatible API (Groq by default).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{defaults, Config};

/// Reply sent to the user whenever the provider call fails for any reason
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble processing that right now.";

/// Turns a user message into a reply. Implementations never fail; errors are
/// absorbed and reported as a user-safe string.
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, text: &str, requester_name: &str) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// System instruction for a given requester
pub fn system_prompt(requester_name: &str) -> String {
    format!(
        "You are a helpful Discord bot. Keep responses concise and friendly. \
         You're responding to a user named {}.",
        requester_name
    )
}

/// One system message plus the user's text, no history
pub fn build_messages(text: &str, requester_name: &str) -> Vec<Message> {
    vec![
        Message {
            role: MessageRole::System,
            content: system_prompt(requester_name),
        },
        Message {
            role: MessageRole::User,
            content: text.to_string(),
        },
    ]
}

/// Extract the generated text from a raw chat completions response body
fn parse_completion(body: &str) -> Result<String, String> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| format!("JSON parse error: {}", e))?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| "Response contained no choices".to_string())?;

    if content.trim().is_empty() {
        return Err("Response content was empty".to_string());
    }
    Ok(content)
}

/// HTTP client for the completion provider
pub struct GroqClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GroqClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.completion_api_url,
            &config.groq_api_key,
            &config.completion_model,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one completion request, surfacing every failure as an error string
    pub async fn try_complete(&self, text: &str, requester_name: &str) -> Result<String, String> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: build_messages(text, requester_name),
            max_tokens: defaults::MAX_TOKENS,
            temperature: defaults::TEMPERATURE,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Request failed: {}", e))?;

        let status = resp.status();
        let raw = resp
            .text()
            .await
            .map_err(|e| format!("Failed to read response body: {}", e))?;

        if !status.is_success() {
            return Err(format!("HTTP {}: {}", status, raw));
        }

        parse_completion(&raw)
    }
}

#[async_trait]
impl Completer for GroqClient {
    async fn complete(&self, text: &str, requester_name: &str) -> String {
        match self.try_complete(text, requester_name).await {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("[Completion] Error getting AI response: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}
