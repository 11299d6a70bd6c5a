//! Configuration loading for renshu.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.renshu/config.toml`)
//! 3. User config (`~/.renshu/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. With no config the coach talks to a local
//! Ollama server and falls back to the OpenAI API.

use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{CoachError, Result};
use crate::grammar::{builtin_rules, GrammarDetector, GrammarRule};
use crate::pipeline::PromptSet;

/// Main configuration struct for renshu.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Model backends and the fallback switch.
    pub llm: LlmConfig,
    /// Where user state is persisted.
    pub storage: StorageConfig,
    /// Persona and framing templates.
    pub prompts: PromptSet,
    /// Grammar rule table.
    pub grammar: GrammarConfig,
}

/// Which wire protocol a backend speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Ollama,
    /// Any OpenAI-compatible chat completions endpoint.
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::OpenAi => "openai",
        }
    }
}

/// One model backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub provider: Provider,
    pub base_url: String,
    /// Model name. Empty lets an Ollama backend pick an installed model.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
    pub timeout_seconds: u64,
}

/// Default request timeout for every backend.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

impl BackendConfig {
    /// Local Ollama server with the default chat model.
    pub fn ollama_default() -> Self {
        Self {
            provider: Provider::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5:7b".to_string(),
            api_key_env: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Hosted OpenAI API with the default fallback model.
    pub fn openai_default() -> Self {
        Self {
            provider: Provider::OpenAi,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Overlay the non-default fields of `other`, judged against `default`.
    fn merge(&mut self, other: BackendConfig, default: &BackendConfig) {
        if other.provider != default.provider {
            self.provider = other.provider;
        }
        if other.base_url != default.base_url {
            self.base_url = other.base_url;
        }
        if other.model != default.model {
            self.model = other.model;
        }
        if other.api_key_env != default.api_key_env {
            self.api_key_env = other.api_key_env;
        }
        if other.timeout_seconds != default.timeout_seconds {
            self.timeout_seconds = other.timeout_seconds;
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::ollama_default()
    }
}

/// Model gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Try the fallback backend when the primary fails.
    pub use_fallback: bool,
    #[serde(deserialize_with = "primary_backend")]
    pub primary: BackendConfig,
    #[serde(deserialize_with = "fallback_backend")]
    pub fallback: BackendConfig,
}

/// A backend table as written in a config file. Missing keys fall back to
/// the defaults of the slot the table sits in, so a partial
/// `[llm.fallback]` still talks to OpenAI.
#[derive(Deserialize)]
struct BackendLayer {
    provider: Option<Provider>,
    base_url: Option<String>,
    model: Option<String>,
    api_key_env: Option<String>,
    timeout_seconds: Option<u64>,
}

impl BackendLayer {
    fn over(self, base: BackendConfig) -> BackendConfig {
        BackendConfig {
            provider: self.provider.unwrap_or(base.provider),
            base_url: self.base_url.unwrap_or(base.base_url),
            model: self.model.unwrap_or(base.model),
            api_key_env: self.api_key_env.or(base.api_key_env),
            timeout_seconds: self.timeout_seconds.unwrap_or(base.timeout_seconds),
        }
    }
}

fn primary_backend<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<BackendConfig, D::Error> {
    BackendLayer::deserialize(deserializer).map(|layer| layer.over(BackendConfig::ollama_default()))
}

fn fallback_backend<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<BackendConfig, D::Error> {
    BackendLayer::deserialize(deserializer).map(|layer| layer.over(BackendConfig::openai_default()))
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            use_fallback: true,
            primary: BackendConfig::ollama_default(),
            fallback: BackendConfig::openai_default(),
        }
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for per-user state files. Defaults to `<renshu home>/user_state`.
    pub state_dir: Option<PathBuf>,
}

/// Grammar detection configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// Replacement rule table. Empty keeps the built-in rules.
    pub rules: Vec<GrammarRule>,
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.renshu/config.toml` in cwd)
    /// 3. User config (`~/.renshu/config.toml`)
    /// 4. Defaults
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.renshu/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = renshu_home()?;
        Self::load_layer(&home.join("config.toml"))
    }

    /// Load project config from `.renshu/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_layer(&cwd.join(".renshu").join("config.toml"))
    }

    /// A missing layer is silent; an unreadable one is reported and skipped.
    fn load_layer(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring config file");
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| CoachError::storage(path, e))?;
        toml::from_str(&content).map_err(|e| CoachError::config(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // RENSHU_PRIMARY_MODEL / RENSHU_FALLBACK_MODEL
        if let Ok(val) = env::var("RENSHU_PRIMARY_MODEL") {
            self.llm.primary.model = val.trim().to_string();
        }
        if let Ok(val) = env::var("RENSHU_FALLBACK_MODEL") {
            self.llm.fallback.model = val.trim().to_string();
        }

        // RENSHU_PRIMARY_URL / RENSHU_FALLBACK_URL
        if let Ok(val) = env::var("RENSHU_PRIMARY_URL") {
            if is_valid_base_url(&val) {
                self.llm.primary.base_url = val;
            } else {
                warn!(
                    "Invalid RENSHU_PRIMARY_URL value '{}'. Expected an http(s) URL. Using '{}'.",
                    val, self.llm.primary.base_url
                );
            }
        }
        if let Ok(val) = env::var("RENSHU_FALLBACK_URL") {
            if is_valid_base_url(&val) {
                self.llm.fallback.base_url = val;
            } else {
                warn!(
                    "Invalid RENSHU_FALLBACK_URL value '{}'. Expected an http(s) URL. Using '{}'.",
                    val, self.llm.fallback.base_url
                );
            }
        }

        // RENSHU_USE_FALLBACK
        if let Ok(val) = env::var("RENSHU_USE_FALLBACK") {
            match parse_bool(&val) {
                Some(b) => self.llm.use_fallback = b,
                None => warn!(
                    "Invalid RENSHU_USE_FALLBACK value '{}'. Expected true/false. Using '{}'.",
                    val, self.llm.use_fallback
                ),
            }
        }

        // RENSHU_TIMEOUT_SECONDS
        if let Ok(val) = env::var("RENSHU_TIMEOUT_SECONDS") {
            match val.trim().parse::<u64>() {
                Ok(n) if n > 0 => {
                    self.llm.primary.timeout_seconds = n;
                    self.llm.fallback.timeout_seconds = n;
                }
                _ => warn!(
                    "Invalid RENSHU_TIMEOUT_SECONDS value '{}'. Expected a positive integer. Using '{}'.",
                    val, self.llm.primary.timeout_seconds
                ),
            }
        }

        // RENSHU_STATE_DIR
        if let Ok(val) = env::var("RENSHU_STATE_DIR") {
            if val.is_empty() {
                warn!("RENSHU_STATE_DIR is empty, ignoring");
            } else {
                self.storage.state_dir = Some(PathBuf::from(val));
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence. All non-default fields from
    /// `other` are applied field by field, so a layer only needs to list its
    /// customizations.
    ///
    /// # Limitation
    ///
    /// A layer cannot set a value back to its default to undo a lower layer.
    /// "Not set" and "set to the default" are indistinguishable here.
    fn merge(mut self, other: Config) -> Self {
        let default_llm = LlmConfig::default();
        if other.llm.use_fallback != default_llm.use_fallback {
            self.llm.use_fallback = other.llm.use_fallback;
        }
        self.llm.primary.merge(other.llm.primary, &default_llm.primary);
        self.llm
            .fallback
            .merge(other.llm.fallback, &default_llm.fallback);

        if other.storage.state_dir.is_some() {
            self.storage.state_dir = other.storage.state_dir;
        }

        let default_prompts = PromptSet::default();
        let PromptSet {
            critique_system,
            critique_user,
            partner_system,
            partner_user,
            translator_system,
            translator_user,
            fallback_reply,
        } = other.prompts;
        if critique_system != default_prompts.critique_system {
            self.prompts.critique_system = critique_system;
        }
        if critique_user != default_prompts.critique_user {
            self.prompts.critique_user = critique_user;
        }
        if partner_system != default_prompts.partner_system {
            self.prompts.partner_system = partner_system;
        }
        if partner_user != default_prompts.partner_user {
            self.prompts.partner_user = partner_user;
        }
        if translator_system != default_prompts.translator_system {
            self.prompts.translator_system = translator_system;
        }
        if translator_user != default_prompts.translator_user {
            self.prompts.translator_user = translator_user;
        }
        if fallback_reply != default_prompts.fallback_reply {
            self.prompts.fallback_reply = fallback_reply;
        }

        if !other.grammar.rules.is_empty() {
            self.grammar.rules = other.grammar.rules;
        }

        self
    }

    /// Directory holding per-user state files.
    pub fn state_dir(&self) -> Option<PathBuf> {
        self.storage
            .state_dir
            .clone()
            .or_else(|| renshu_home().map(|h| h.join("user_state")))
    }

    /// Grammar detector over the configured rule table.
    pub fn detector(&self) -> GrammarDetector {
        if self.grammar.rules.is_empty() {
            GrammarDetector::new(builtin_rules())
        } else {
            GrammarDetector::new(self.grammar.rules.clone())
        }
    }
}

fn is_valid_base_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Get the renshu home directory.
///
/// Uses `RENSHU_HOME` when set to a non-empty value, otherwise `~/.renshu`.
/// Relative values are canonicalized when the path exists.
pub fn renshu_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("RENSHU_HOME") {
        if home.is_empty() {
            warn!("RENSHU_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            warn!("RENSHU_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".renshu"));
    }

    let fallback_path = env::temp_dir().join("renshu");
    warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

/// Get the crash log path.
///
/// Returns `<renshu_home>/crash.log`.
pub fn crash_log_path() -> Option<PathBuf> {
    renshu_home().map(|h| h.join("crash.log"))
}
