//! Application configuration for Boardroom.
//!
//! User config lives at `~/.boardroom/boardroom.toml` unless `--config` points
//! elsewhere. CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BoardroomError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "boardroom.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".boardroom";

// ---------------------------------------------------------------------------
// Config structs (matching boardroom.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text-generation endpoint settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Retry policy around each agent call.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,
}

/// `[agent]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the Responses API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout. Unset means wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "gpt-4.1-mini".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

/// `[retry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per agent call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each subsequent retry.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Upper bound on any single delay.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    1_000
}
fn default_max_delay() -> u64 {
    30_000
}

/// `[paths]` section. Relative paths resolve against the working directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the per-stage instruction files.
    #[serde(default = "default_agents_dir")]
    pub agents_dir: String,

    /// Optional folder of supporting documents.
    #[serde(default = "default_context_dir")]
    pub context_dir: String,

    /// Where artifacts are written.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            agents_dir: default_agents_dir(),
            context_dir: default_context_dir(),
            out_dir: default_out_dir(),
        }
    }
}

fn default_agents_dir() -> String {
    "agents".into()
}
fn default_context_dir() -> String {
    "context".into()
}
fn default_out_dir() -> String {
    "out".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.boardroom/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BoardroomError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.boardroom/boardroom.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from the default location.
/// Returns defaults if the file does not exist or no home directory is known.
pub fn load_config() -> Result<AppConfig> {
    let Ok(path) = config_file_path() else {
        tracing::debug!("no home directory, using default config");
        return Ok(AppConfig::default());
    };

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BoardroomError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        BoardroomError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Read the API key from the env var named in the config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.agent.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(BoardroomError::config(format!(
            "API key not found. Set the {var_name} environment variable (a .env file works too)."
        ))),
    }
}
