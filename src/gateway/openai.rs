//! OpenAI-compatible chat completions backend.
//!
//! Used as the hosted fallback behind a local model. Any server that speaks
//! `POST {base_url}/chat/completions` works.

use std::env;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BackendConfig;
use crate::core::Message;
use crate::error::{CoachError, Result};
use crate::gateway::ModelBackend;

const NAME: &str = "openai";

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Backend for an OpenAI-compatible endpoint.
pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiBackend {
    /// Build a backend from its config section.
    ///
    /// The API key is read from the environment variable named by
    /// `api_key_env`; a missing key is allowed for local servers.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CoachError::config(format!("failed to build HTTP client: {}", e)))?;

        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| env::var(var).ok())
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn extract_text(body: CompletionResponse) -> String {
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }
}

impl ModelBackend for OpenAiBackend {
    fn complete(&self, conversation: &[Message]) -> Result<String> {
        if self.model.trim().is_empty() {
            return Err(CoachError::model(NAME, "no model configured"));
        }

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, messages = conversation.len(), "chat completion request");

        let mut request = self.client.post(&url).json(&CompletionRequest {
            model: &self.model,
            messages: conversation,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| CoachError::model(NAME, format!("POST {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(CoachError::model(
                NAME,
                format!("POST {} returned {}: {}", url, status, body.trim()),
            ));
        }

        let body: CompletionResponse = response
            .json()
            .map_err(|e| CoachError::model(NAME, format!("invalid completion body: {}", e)))?;

        Ok(Self::extract_text(body))
    }

    fn ping(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        request
            .send()
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        NAME
    }
}
