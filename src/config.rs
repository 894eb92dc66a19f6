//! Service configuration: workflow endpoint + credentials and the vocabulary store.
//!
//! Loaded once at startup. Values come from an optional TOML file
//! (`APP_CONFIG_PATH`) and are overridden by environment variables.

use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_WORKFLOW_USER: &str = "recipe-vocab-user";

/// Settings accepted in the TOML file. Every field is optional there.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct FileConfig {
  #[serde(default)] pub generation_endpoint: Option<String>,
  #[serde(default)] pub generation_credential: Option<String>,
  #[serde(default)] pub recipe_credential: Option<String>,
  #[serde(default)] pub workflow_user: Option<String>,
  #[serde(default)] pub supabase_url: Option<String>,
  #[serde(default)] pub supabase_key: Option<String>,
}

/// Resolved, immutable configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
  pub generation_endpoint: String,
  /// Bearer credential of the quiz workflow.
  pub generation_credential: String,
  /// Bearer credential of the recipe workflow.
  pub recipe_credential: String,
  pub workflow_user: String,
  pub supabase_url: String,
  pub supabase_key: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("Missing required setting: {0}")]
  Missing(&'static str),
  #[error("Failed to read config file {path}: {reason}")]
  Read { path: String, reason: String },
  #[error("Failed to parse config file {path}: {reason}")]
  Parse { path: String, reason: String },
}

impl AppConfig {
  /// Load from `APP_CONFIG_PATH` (if set) and the process environment.
  pub fn from_env() -> Result<Self, ConfigError> {
    let file = match std::env::var("APP_CONFIG_PATH") {
      Ok(path) => load_file(&path)?,
      Err(_) => FileConfig::default(),
    };
    Self::resolve(file, |k| std::env::var(k).ok())
  }

  /// Merge file values with an env lookup (env wins).
  pub fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let pick = |key: &str, from_file: Option<String>| env(key).filter(|v| !v.is_empty()).or(from_file);

    let generation_endpoint = pick("GENERATION_ENDPOINT", file.generation_endpoint)
      .ok_or(ConfigError::Missing("GENERATION_ENDPOINT"))?;
    let generation_credential = pick("GENERATION_CREDENTIAL", file.generation_credential)
      .ok_or(ConfigError::Missing("GENERATION_CREDENTIAL"))?;
    let recipe_credential = pick("RECIPE_CREDENTIAL", file.recipe_credential)
      .unwrap_or_else(|| generation_credential.clone());
    let workflow_user = pick("WORKFLOW_USER", file.workflow_user)
      .unwrap_or_else(|| DEFAULT_WORKFLOW_USER.into());
    let supabase_url = pick("SUPABASE_URL", file.supabase_url)
      .ok_or(ConfigError::Missing("SUPABASE_URL"))?;
    let supabase_key = pick("SUPABASE_KEY", file.supabase_key)
      .ok_or(ConfigError::Missing("SUPABASE_KEY"))?;

    Ok(Self {
      generation_endpoint,
      generation_credential,
      recipe_credential,
      workflow_user,
      supabase_url: supabase_url.trim_end_matches('/').to_string(),
      supabase_key,
    })
  }
}

fn load_file(path: &str) -> Result<FileConfig, ConfigError> {
  let s = std::fs::read_to_string(path).map_err(|e| {
    error!(target: "recipe_vocab", %path, error = %e, "Failed to read TOML config file");
    ConfigError::Read { path: path.into(), reason: e.to_string() }
  })?;
  let cfg = toml::from_str::<FileConfig>(&s).map_err(|e| {
    error!(target: "recipe_vocab", %path, error = %e, "Failed to parse TOML config");
    ConfigError::Parse { path: path.into(), reason: e.to_string() }
  })?;
  info!(target: "recipe_vocab", %path, "Loaded config (TOML)");
  Ok(cfg)
}
