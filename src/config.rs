//! Environment-derived configuration.
//!
//! All knobs are plain environment variables (optionally loaded from a
//! `.env` file by the binary). Missing or unparseable values fall back to
//! defaults so the agent always comes up with a usable configuration.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_OUTPUT_ROOT: &str = "workspace";
pub const DEFAULT_MODEL_BASE_URL: &str = "http://127.0.0.1:8000/v1";
pub const DEFAULT_MODEL: &str = "qwen3-8b-int8";
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory documents may be written under. The containment
    /// invariant in the document tool is checked against this path.
    pub output_root: PathBuf,
    pub backend: BackendConfig,
    /// Address the HTTP server binds to (`serve` subcommand).
    pub bind_addr: String,
}

/// Connection settings for the OpenAI-compatible text-generation endpoint.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            output_root: PathBuf::from(var_or("DESKAGENT_OUTPUT_ROOT", DEFAULT_OUTPUT_ROOT)),
            backend: BackendConfig {
                base_url: var_or("DESKAGENT_MODEL_BASE_URL", DEFAULT_MODEL_BASE_URL),
                model: var_or("DESKAGENT_MODEL", DEFAULT_MODEL),
                api_key: env::var("DESKAGENT_API_KEY").ok().filter(|v| !v.is_empty()),
                max_tokens: parsed_var_or("DESKAGENT_MAX_TOKENS", DEFAULT_MAX_TOKENS),
                temperature: parsed_var_or("DESKAGENT_TEMPERATURE", DEFAULT_TEMPERATURE),
            },
            bind_addr: var_or("DESKAGENT_BIND_ADDR", DEFAULT_BIND_ADDR),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            backend: BackendConfig::default(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_MODEL_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parsed_var_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
