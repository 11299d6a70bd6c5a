//! Model gateway for renshu.
//!
//! This module provides the backend trait, the primary/fallback gateway the
//! pipeline talks to, and the concrete backends.
//!
//! Available backends:
//! - **Ollama**: local server, the default primary
//! - **OpenAI-compatible**: hosted chat completions, the default fallback
//! - **Scripted**: canned replies for offline runs and tests

pub mod fallback;
pub mod ollama;
pub mod openai;
pub mod scripted;
pub mod traits;

pub use fallback::ModelGateway;
pub use ollama::{LocalModel, OllamaBackend};
pub use openai::OpenAiBackend;
pub use scripted::{ScriptedBackend, ScriptedReply};
pub use traits::ModelBackend;

use crate::config::{BackendConfig, LlmConfig, Provider};
use crate::error::Result;

/// Build one backend from its config section.
pub fn create_backend(config: &BackendConfig) -> Result<Box<dyn ModelBackend>> {
    Ok(match config.provider {
        Provider::Ollama => Box::new(OllamaBackend::from_config(config)?),
        Provider::OpenAi => Box::new(OpenAiBackend::from_config(config)?),
    })
}

/// Build the gateway described by the `[llm]` config section.
pub fn create_gateway(config: &LlmConfig) -> Result<ModelGateway> {
    let gateway = ModelGateway::new(create_backend(&config.primary)?);
    if !config.use_fallback {
        return Ok(gateway);
    }
    Ok(gateway.with_fallback(create_backend(&config.fallback)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_create_gateway_with_fallback() {
        let config = Config::default();
        let gateway = create_gateway(&config.llm).unwrap();
        assert_eq!(gateway.primary_name(), "ollama");
        assert_eq!(gateway.fallback_name(), Some("openai"));
    }

    #[test]
    fn test_create_gateway_without_fallback() {
        let mut config = Config::default();
        config.llm.use_fallback = false;
        let gateway = create_gateway(&config.llm).unwrap();
        assert_eq!(gateway.fallback_name(), None);
    }
}
