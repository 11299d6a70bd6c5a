//! Ollama chat backend.
//!
//! Talks to a local Ollama server over its HTTP API: `POST /api/chat` for
//! generation and `GET /api/tags` for model discovery.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BackendConfig;
use crate::core::Message;
use crate::error::{CoachError, Result};
use crate::gateway::ModelBackend;

const NAME: &str = "ollama";

/// A model installed on the Ollama server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalModel {
    pub name: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub modified_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantization: Option<String>,
}

impl LocalModel {
    /// Human-readable size (KB / MB / GB).
    pub fn size_display(&self) -> String {
        format_size(self.size_bytes)
    }
}

/// Format a byte count with the largest fitting binary unit.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KB * KB * KB {
        format!("{:.2} GB", b / (KB * KB * KB))
    } else if b >= KB * KB {
        format!("{:.2} MB", b / (KB * KB))
    } else {
        format!("{:.2} KB", b / KB)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
    /// Keep reasoning models from mixing their thinking into the reply.
    think: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    modified_at: String,
    #[serde(default)]
    details: Option<TagDetails>,
}

#[derive(Deserialize)]
struct TagDetails {
    quantization_level: Option<String>,
}

/// Backend for a local Ollama server.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    /// Configured model; empty means "pick the smallest installed model".
    model: String,
    resolved_model: OnceLock<String>,
}

impl OllamaBackend {
    /// Build a backend from its config section.
    pub fn from_config(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| CoachError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.trim().to_string(),
            resolved_model: OnceLock::new(),
        })
    }

    /// Installed models, smallest first.
    pub fn list_models(&self) -> Result<Vec<LocalModel>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| CoachError::model(NAME, format!("GET {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(CoachError::model(
                NAME,
                format!("GET {} returned {}", url, response.status()),
            ));
        }

        let tags: TagsResponse = response
            .json()
            .map_err(|e| CoachError::model(NAME, format!("invalid /api/tags body: {}", e)))?;

        let mut models: Vec<LocalModel> = tags
            .models
            .into_iter()
            .filter_map(|m| {
                let name = m.name.or(m.model)?;
                Some(LocalModel {
                    name,
                    size_bytes: m.size,
                    modified_at: m.modified_at,
                    quantization: m.details.and_then(|d| d.quantization_level),
                })
            })
            .collect();
        models.sort_by_key(|m| m.size_bytes);
        Ok(models)
    }

    /// The model used for generation, resolving it on first use.
    pub fn model(&self) -> Result<String> {
        if !self.model.is_empty() {
            return Ok(self.model.clone());
        }
        if let Some(model) = self.resolved_model.get() {
            return Ok(model.clone());
        }

        let smallest = self
            .list_models()?
            .into_iter()
            .next()
            .ok_or_else(|| CoachError::model(NAME, "no models installed"))?;
        info!(model = %smallest.name, "no model configured, using smallest installed model");
        Ok(self.resolved_model.get_or_init(|| smallest.name).clone())
    }
}

impl ModelBackend for OllamaBackend {
    fn complete(&self, conversation: &[Message]) -> Result<String> {
        let model = self.model()?;
        let url = format!("{}/api/chat", self.base_url);
        debug!(%model, messages = conversation.len(), "ollama chat request");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                model: &model,
                messages: conversation,
                stream: false,
                think: false,
            })
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

        let body: ChatResponse = response
            .json()
            .map_err(|e| CoachError::model(NAME, format!("invalid chat body: {}", e)))?;

        Ok(body
            .message
            .map(|m| m.content.trim().to_string())
            .unwrap_or_default())
    }

    fn ping(&self) -> bool {
        self.list_models().is_ok()
    }

    fn name(&self) -> &str {
        NAME
    }
}
