use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::ChatError;
use crate::models::{ChatMessage, GenerationOptions};

pub const DEFAULT_SYSTEM_PREAMBLE: &str = "\
You are a study assistant answering questions about a private document collection.
Base every answer exclusively on the provided context. Cite the source document \
in parentheses for each main point, quote short passages where they help, and \
say plainly when the context does not cover part of the question.";

/// System message first, prior turns in order, the new user message last. The
/// assembled context rides inside the system message so it never pollutes the
/// replayable history.
pub fn build_messages(
    preamble: &str,
    context: &str,
    history: &[ChatMessage],
    user_message: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(format!(
        "{preamble}\n\nContext from the documents:\n{context}"
    )));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(user_message));
    messages
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: String,
    pub generation: GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Minimal client for an OpenAI-compatible chat completion endpoint.
pub struct ChatClient {
    client: Client,
    endpoint: Url,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        let endpoint = Url::parse(&format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        ))?;
        Ok(Self {
            client: Client::new(),
            endpoint,
            config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.generation.model
    }

    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let generation = &self.config.generation;
        let payload = serde_json::json!({
            "model": generation.model,
            "messages": messages,
            "temperature": generation.temperature,
            "max_tokens": generation.max_tokens,
            "presence_penalty": generation.presence_penalty,
            "frequency_penalty": generation.frequency_penalty,
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let completion: CompletionResponse = serde_json::from_str(&body)?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ChatError::MalformedResponse("no message content in first choice".to_string())
            })
    }
}
