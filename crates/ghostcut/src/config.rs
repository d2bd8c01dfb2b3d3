//! Application configuration.
//!
//! Loaded from a TOML file; every section and field has a sensible default
//! so a missing config file falls back to defaults entirely. The API key
//! for the LLM producer is deliberately not part of the file; it comes
//! from the `GHOSTCUT_API_KEY` environment variable.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub producer: ProducerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Settings for the external claims producer.
#[derive(Debug, Deserialize, Clone)]
pub struct ProducerConfig {
    /// `"disabled"` or `"openai"` (any OpenAI-compatible chat-completions
    /// endpoint).
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    5
}

/// Caps on how much text is forwarded to the producer. Verification always
/// runs against the same truncated text the producer saw, so the claims
/// and the source they are checked against stay consistent.
#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    /// Max chars of source text sent for compression.
    #[serde(default = "default_compress_chars")]
    pub compress_chars: usize,
    /// Max chars of source text sent for a retrieval audit.
    #[serde(default = "default_audit_chars")]
    pub audit_chars: usize,
    /// Length of the raw-text preview echoed back to clients.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            compress_chars: default_compress_chars(),
            audit_chars: default_audit_chars(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_compress_chars() -> usize {
    30_000
}
fn default_audit_chars() -> usize {
    10_000
}
fn default_preview_chars() -> usize {
    2_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8787".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Config> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }
}
