//! Text generation service used for rent classification and commentary.

use crate::error::FetchError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

#[async_trait::async_trait]
pub trait TextModel: Send + Sync + 'static {
    /// Deterministic completion expected to be a single-word label
    async fn classify(&self, prompt: &str) -> Result<String, FetchError>;

    /// Free-form prose
    async fn generate(&self, prompt: &str) -> Result<String, FetchError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
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
    content: Option<String>,
}

/// OpenAI chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
    classify_temperature: f32,
    generate_temperature: f32,
}

impl OpenAiChat {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Unavailable(format!("failed to build LLM client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: "gpt-4".to_string(),
            classify_temperature: 0.0,
            generate_temperature: 0.5,
        })
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, FetchError> {
        let request = ChatRequest {
            model: &self.model,
            temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(format!("chat completion request: {e}")))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(FetchError::HttpStatus {
                status,
                url: CHAT_COMPLETIONS_URL.to_string(),
            });
        }

        let payload: ChatResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::Data(format!("chat completion payload: {e}")))?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| FetchError::Data("chat completion had no content".to_string()))
    }
}

#[async_trait::async_trait]
impl TextModel for OpenAiChat {
    async fn classify(&self, prompt: &str) -> Result<String, FetchError> {
        self.complete(prompt, self.classify_temperature).await
    }

    async fn generate(&self, prompt: &str) -> Result<String, FetchError> {
        self.complete(prompt, self.generate_temperature).await
    }
}
