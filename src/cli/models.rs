//! Models command for renshu.
//!
//! Reports which model backends are configured and reachable, and lists the
//! models installed on any local Ollama server.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BackendConfig, LlmConfig, Provider};
use crate::gateway::{create_backend, LocalModel, ModelBackend, OllamaBackend};

/// Options for the models command.
#[derive(Debug, Clone, Default)]
pub struct ModelsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Status of one configured backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendStatus {
    /// "primary" or "fallback".
    pub role: String,
    /// Backend name.
    pub name: String,
    pub provider: Provider,
    pub base_url: String,
    pub model: String,
    /// Whether the backend answered a ping.
    pub reachable: bool,
    /// Whether the gateway will use this backend.
    pub enabled: bool,
}

impl BackendStatus {
    /// Probe `backend`, described by `config`.
    pub fn probe(
        role: &str,
        config: &BackendConfig,
        backend: &dyn ModelBackend,
        enabled: bool,
    ) -> Self {
        let reachable = backend.ping();
        debug!(role, backend = backend.name(), reachable, "backend probe");
        Self {
            role: role.to_string(),
            name: backend.name().to_string(),
            provider: config.provider,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            reachable,
            enabled,
        }
    }

    /// Status of a backend the gateway will not use; it is not probed.
    pub fn disabled(role: &str, config: &BackendConfig) -> Self {
        Self {
            role: role.to_string(),
            name: config.provider.as_str().to_string(),
            provider: config.provider,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            reachable: false,
            enabled: false,
        }
    }
}

/// Output format for the models command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsOutput {
    /// Always true; unreachable backends are reported, not failed.
    pub success: bool,
    pub backends: Vec<BackendStatus>,
    /// Models installed on the local Ollama server, smallest first.
    pub local_models: Vec<LocalModel>,
    /// Problems found while probing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// The models command implementation.
pub struct ModelsCommand {
    config: LlmConfig,
}

impl ModelsCommand {
    /// Create a new models command.
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    /// Run the models command.
    pub fn run(&self) -> ModelsOutput {
        let mut backends = Vec::new();
        let mut local_models = Vec::new();
        let mut warnings = Vec::new();

        let slots = [
            ("primary", &self.config.primary, true),
            ("fallback", &self.config.fallback, self.config.use_fallback),
        ];

        for (role, config, enabled) in slots {
            if !enabled {
                backends.push(BackendStatus::disabled(role, config));
                continue;
            }

            match create_backend(config) {
                Ok(backend) => backends.push(BackendStatus::probe(role, config, &*backend, true)),
                Err(e) => warnings.push(format!("{} backend: {}", role, e)),
            }

            if config.provider == Provider::Ollama && local_models.is_empty() {
                match OllamaBackend::from_config(config).and_then(|b| b.list_models()) {
                    Ok(models) => local_models = models,
                    Err(e) => warnings.push(format!("could not list local models: {}", e)),
                }
            }
        }

        ModelsOutput {
            success: true,
            backends,
            local_models,
            warnings,
        }
    }

    /// Format the output based on options.
    pub fn format_output(&self, output: &ModelsOutput, options: &ModelsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        format_models_human_readable(output)
    }
}

fn format_models_human_readable(output: &ModelsOutput) -> String {
    let mut lines = vec!["Backends:".to_string()];
    for b in &output.backends {
        let status = match (b.enabled, b.reachable) {
            (false, _) => "disabled",
            (true, true) => "reachable",
            (true, false) => "unreachable",
        };
        let model = if b.model.is_empty() {
            "(auto)"
        } else {
            b.model.as_str()
        };
        lines.push(format!(
            "  {:<8} {:<8} {}  model {}  [{}]",
            b.role, b.name, b.base_url, model, status
        ));
    }

    if !output.local_models.is_empty() {
        lines.push(String::new());
        lines.push("Local models:".to_string());
        for m in &output.local_models {
            let quant = m.quantization.as_deref().unwrap_or("-");
            lines.push(format!("  {:<24} {:>10}  {}", m.name, m.size_display(), quant));
        }
    }

    if !output.warnings.is_empty() {
        lines.push(String::new());
        for w in &output.warnings {
            lines.push(format!("warning: {}", w));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScriptedBackend;

    fn sample_output() -> ModelsOutput {
        let primary = BackendConfig::ollama_default();
        let fallback = BackendConfig::openai_default();
        ModelsOutput {
            success: true,
            backends: vec![
                BackendStatus::probe(
                    "primary",
                    &primary,
                    &ScriptedBackend::constant("").named("ollama"),
                    true,
                ),
                BackendStatus::disabled("fallback", &fallback),
            ],
            local_models: vec![LocalModel {
                name: "qwen2.5:7b".to_string(),
                size_bytes: 4_683_087_332,
                modified_at: String::new(),
                quantization: Some("Q4_K_M".to_string()),
            }],
            warnings: vec![],
        }
    }

    #[test]
    fn test_probe_copies_config() {
        let config = BackendConfig::ollama_default();
        let status = BackendStatus::probe("primary", &config, &ScriptedBackend::constant(""), true);

        assert_eq!(status.name, "scripted");
        assert_eq!(status.provider, Provider::Ollama);
        assert_eq!(status.model, "qwen2.5:7b");
    }

    #[test]
    fn test_human_readable() {
        let cmd = ModelsCommand::new(LlmConfig::default());
        let text = cmd.format_output(&sample_output(), &ModelsOptions::default());

        assert!(text.contains("primary"));
        assert!(text.contains("[disabled]"));
        assert!(text.contains("4.36 GB"));
        assert!(text.contains("Q4_K_M"));
    }

    #[test]
    fn test_json_shape() {
        let cmd = ModelsCommand::new(LlmConfig::default());
        let options = ModelsOptions {
            json: true,
            ..Default::default()
        };
        let value: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&sample_output(), &options)).unwrap();

        assert_eq!(value["backends"][0]["provider"], "ollama");
        assert_eq!(value["backends"][1]["enabled"], false);
        assert_eq!(value["local_models"][0]["size_bytes"], 4_683_087_332u64);
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn test_run_reports_unreachable_without_failing() {
        let mut config = LlmConfig::default();
        config.primary.base_url = "http://127.0.0.1:9".to_string();
        config.primary.timeout_seconds = 1;
        config.use_fallback = false;

        let output = ModelsCommand::new(config).run();

        assert!(output.success);
        assert!(!output.backends[0].reachable);
        assert_eq!(output.backends[1].name, "openai");
        assert!(!output.backends[1].enabled);
        assert!(output.local_models.is_empty());
        assert!(!output.warnings.is_empty());
    }
}
