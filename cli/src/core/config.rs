//! # StackAI Configuration System
//!
//! File: cli/src/core/config.rs
//!
//! ## Overview
//!
//! This module implements the configuration system for StackAI, handling loading,
//! merging, validation, and access to configuration data. It decides which model
//! backend the relay talks to and how the `serve` command binds.
//!
//! ## Architecture
//!
//! Configuration sources (in order of precedence):
//! 1. An explicit file given with `--config` / `STACKAI_CONFIG` (used alone)
//! 2. Project-specific `.stackai.toml` in current directory or ancestors
//! 3. User-specific `config.toml` in the platform config directory
//! 4. Default values defined in the code
//!
//! The user and project files are merged key by key: whatever the project file
//! sets wins, even a value equal to the default, and anything it leaves out
//! keeps the user's setting.
//!
//! ## Examples
//!
//! ```toml
//! [model]
//! provider = "completions"
//! base_url = "http://127.0.0.1:8080/v1"
//! model = "dialogpt-medium"
//! max_new_tokens = 50
//!
//! [server]
//! port = 3000
//! ```
//!
//! ```rust
//! let cfg = config::load_config(None)?;
//! let generator = generator::load_generator(&cfg.model)?;
//! ```
//!
use crate::core::error::{Result, StackAiError};
use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Represents the main configuration structure, loaded from TOML files.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)] // Error if unknown fields are in TOML
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerSection,
}

/// Which kind of model backend to build.
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Use the chat backend when an API key is available, otherwise run without a model.
    #[default]
    Auto,
    /// Never call a model; every reply comes from the fallback responder.
    None,
    /// Raw text continuation via `POST {base_url}/completions`.
    Completions,
    /// Role-tagged messages via `POST {base_url}/chat/completions`.
    Chat,
}

/// Settings for the model backend (`[model]`).
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: Provider,
    /// Base URL of the OpenAI-compatible API, including the version segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key given inline. Takes precedence over `api_key_env`.
    pub api_key: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// System message for the chat backend.
    pub system_prompt: Option<String>,
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// When false the backend is asked for greedy decoding (temperature 0).
    #[serde(default = "default_do_sample")]
    pub do_sample: bool,
    /// Whole-request timeout for one model call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Settings for `stackai serve` (`[server]`).
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            system_prompt: None,
            max_new_tokens: default_max_new_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            do_sample: default_do_sample(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_enable_cors(),
        }
    }
}

impl ModelConfig {
    /// Returns the API key: the inline `api_key` first, then the variable named by `api_key_env`.
    /// Empty values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            return Some(key.to_string());
        }
        if self.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_max_new_tokens() -> u32 {
    50
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.9
}
fn default_do_sample() -> bool {
    true
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}
fn default_port() -> u16 {
    3000
}
fn default_enable_cors() -> bool {
    true
}

const PROJECT_CONFIG_FILENAME: &str = ".stackai.toml";

/// Loads the effective configuration.
///
/// With `explicit` set, only that file is read (after `~` expansion) and it must exist.
/// Otherwise the user and project files are discovered and merged over the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => {
            let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
            info!("Loading configuration from: {}", expanded.display());
            if !expanded.is_file() {
                return Err(anyhow!(StackAiError::Config(format!(
                    "Configuration file '{}' does not exist.",
                    expanded.display()
                ))));
            }
            load_config_from_path(&expanded)?
        }
        None => {
            let user_config = load_user_config()?;
            let project_config = load_project_config()?;
            merge_configs(user_config.unwrap_or_default(), project_config)?
        }
    };
    validate_config(&config).context("Configuration validation failed")?;
    debug!("Final loaded configuration: {:?}", redacted(&config));
    Ok(config)
}

fn load_user_config() -> Result<Option<toml::Table>> {
    if let Some(proj_dirs) = ProjectDirs::from("com", "StackAI", "stackai") {
        let config_path = proj_dirs.config_dir().join("config.toml");
        if config_path.exists() {
            info!("Loading user configuration from: {}", config_path.display());
            load_layer_from_path(&config_path).map(Some)
        } else {
            debug!(
                "User configuration file not found at {}",
                config_path.display()
            );
            Ok(None)
        }
    } else {
        warn!("Could not determine user config directory.");
        Ok(None)
    }
}

fn load_project_config() -> Result<Option<toml::Table>> {
    if let Some(project_config_path) = find_project_config_path()? {
        info!(
            "Loading project configuration from: {}",
            project_config_path.display()
        );
        load_layer_from_path(&project_config_path).map(Some)
    } else {
        debug!("No project configuration file (.stackai.toml) found in current directory or ancestors.");
        Ok(None)
    }
}

fn find_project_config_path() -> Result<Option<PathBuf>> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    find_project_config_from(&current_dir)
}

fn find_project_config_from(start: &Path) -> Result<Option<PathBuf>> {
    let mut path: &Path = start;
    loop {
        let project_config = path.join(PROJECT_CONFIG_FILENAME);
        if project_config.is_file() {
            return Ok(Some(project_config));
        }
        if path.join(".git").is_dir() {
            debug!(
                "Found .git directory at {}, stopping project config search.",
                path.display()
            );
            return Ok(None);
        }
        match path.parent() {
            Some(parent) => path = parent,
            None => break,
        }
    }
    Ok(None)
}

fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Reads one file of a layered setup. The file is checked against the schema up
/// front so errors name the offending file, but it is kept as a raw table: the
/// merge needs to know which keys the file actually sets.
fn load_layer_from_path(path: &Path) -> Result<toml::Table> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from file: {}", path.display()))
}

/// Lays the project table over the user table and fills the gaps with defaults.
///
/// Every key present in the project file wins, even when it repeats a default
/// value; keys it leaves out keep the user's setting.
fn merge_configs(mut user: toml::Table, project: Option<toml::Table>) -> Result<Config> {
    if let Some(project) = project {
        overlay(&mut user, project);
    }
    toml::Value::Table(user)
        .try_into()
        .context("Failed to combine user and project configuration")
}

fn overlay(base: &mut toml::Table, top: toml::Table) {
    for (key, value) in top {
        match value {
            toml::Value::Table(top_section) => {
                if let Some(toml::Value::Table(base_section)) = base.get_mut(&key) {
                    overlay(base_section, top_section);
                    continue;
                }
                base.insert(key, toml::Value::Table(top_section));
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}

fn validate_config(config: &Config) -> Result<()> {
    info!("Validating final configuration...");
    let model = &config.model;
    let url = reqwest::Url::parse(&model.base_url).map_err(|e| {
        anyhow!(StackAiError::Config(format!(
            "Invalid model base_url '{}': {}",
            model.base_url, e
        )))
    })?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!(StackAiError::Config(format!(
            "Model base_url '{}' must use http or https.",
            model.base_url
        ))));
    }
    if model.model.trim().is_empty() {
        return Err(anyhow!(StackAiError::Config(
            "Model name must not be empty.".to_string()
        )));
    }
    if model.max_new_tokens == 0 {
        return Err(anyhow!(StackAiError::Config(
            "max_new_tokens must be greater than zero.".to_string()
        )));
    }
    if model.timeout_secs == 0 {
        return Err(anyhow!(StackAiError::Config(
            "timeout_secs must be greater than zero.".to_string()
        )));
    }
    if model.top_p.is_nan() || model.top_p <= 0.0 || model.top_p > 1.0 {
        return Err(anyhow!(StackAiError::Config(format!(
            "top_p must be in (0, 1], got {}.",
            model.top_p
        ))));
    }
    if model.temperature.is_nan() || model.temperature < 0.0 {
        return Err(anyhow!(StackAiError::Config(format!(
            "temperature must not be negative, got {}.",
            model.temperature
        ))));
    }
    info!("Configuration validation successful.");
    Ok(())
}

/// Copy of the config safe to log.
fn redacted(config: &Config) -> Config {
    let mut copy = config.clone();
    if copy.model.api_key.is_some() {
        copy.model.api_key = Some("<redacted>".to_string());
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_deserialize_basic_toml() {
        let toml_content = r#"
            [model]
            provider = "completions"
            base_url = "http://127.0.0.1:8080/v1"
            model = "dialogpt-medium"
            max_new_tokens = 64

            [server]
            port = 9000
        "#;

        let config: Config = toml::from_str(toml_content).expect("Failed to parse TOML");

        assert_eq!(config.model.provider, Provider::Completions);
        assert_eq!(config.model.base_url, "http://127.0.0.1:8080/v1");
        assert_eq!(config.model.model, "dialogpt-medium");
        assert_eq!(config.model.max_new_tokens, 64);
        assert_eq!(config.model.top_p, default_top_p()); // Default
        assert!(config.model.do_sample); // Default
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, default_host()); // Default
        assert!(config.server.enable_cors);
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: Config = toml::from_str("").expect("Failed to parse TOML");
        assert_eq!(config, Config::default());
        assert_eq!(config.model.provider, Provider::Auto);
        assert_eq!(config.model.timeout_secs, 120);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str(
            r#"
            [model]
            temprature = 0.2
        "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_project_overrides_user() {
        let user: toml::Table = toml::from_str(
            r#"
            [model]
            provider = "chat"
            model = "user-model"
            api_key = "user-key"
            [server]
            port = 4000
        "#,
        )
        .unwrap();
        let project: toml::Table = toml::from_str(
            r#"
            [model]
            model = "project-model"
            temperature = 0.2
        "#,
        )
        .unwrap();

        let merged = merge_configs(user, Some(project)).unwrap();

        assert_eq!(merged.model.provider, Provider::Chat); // From user
        assert_eq!(merged.model.model, "project-model"); // Project wins
        assert_eq!(merged.model.temperature, 0.2);
        assert_eq!(merged.model.api_key.as_deref(), Some("user-key"));
        assert_eq!(merged.server.port, 4000);
        assert_eq!(merged.server.host, default_host());
    }

    #[test]
    fn test_merge_project_setting_default_value_still_wins() {
        let user: toml::Table =
            toml::from_str("[model]\nprovider = \"chat\"\n[server]\nport = 4000\n").unwrap();
        let project: toml::Table =
            toml::from_str("[model]\nprovider = \"auto\"\n[server]\nport = 3000\n").unwrap();

        let merged = merge_configs(user, Some(project)).unwrap();

        assert_eq!(merged.model.provider, Provider::Auto);
        assert_eq!(merged.server.port, 3000);
    }

    #[test]
    fn test_merge_without_project_returns_user() {
        let user: toml::Table = toml::from_str("[server]\nport = 4100\n").unwrap();
        let merged = merge_configs(user, None).unwrap();
        assert_eq!(merged.server.port, 4100);
        assert_eq!(merged.model, ModelConfig::default());
    }

    #[test]
    fn test_merge_nothing_gives_defaults() {
        assert_eq!(merge_configs(toml::Table::new(), None).unwrap(), Config::default());
    }

    #[test]
    fn test_load_layer_names_file_on_unknown_field() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join(PROJECT_CONFIG_FILENAME);
        fs::write(&path, "[model]\ntemprature = 0.2\n").unwrap();

        let err = load_layer_from_path(&path).unwrap_err();
        assert!(format!("{:#}", err).contains(PROJECT_CONFIG_FILENAME));
    }

    #[test]
    fn test_find_project_config_stops_at_git_root() {
        let temp_dir = tempdir().unwrap();
        let repo = temp_dir.path().join("repo");
        let nested = repo.join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir(repo.join(".git")).unwrap();
        // Above the git root; must not be found.
        fs::write(temp_dir.path().join(PROJECT_CONFIG_FILENAME), "").unwrap();

        assert_eq!(find_project_config_from(&nested).unwrap(), None);

        fs::write(repo.join("a").join(PROJECT_CONFIG_FILENAME), "").unwrap();
        assert_eq!(
            find_project_config_from(&nested).unwrap(),
            Some(repo.join("a").join(PROJECT_CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_load_explicit_config() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("relay.toml");
        fs::write(&path, "[model]\nprovider = \"none\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.model.provider, Provider::None);
    }

    #[test]
    fn test_load_explicit_config_missing_file() {
        let temp_dir = tempdir().unwrap();
        let result = load_config(Some(&temp_dir.path().join("missing.toml")));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_validate_config_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_config_invalid_url() {
        let config = Config {
            model: ModelConfig {
                base_url: "localhost:8080".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("must use http or https"));
    }

    #[test]
    fn test_validate_config_invalid_top_p() {
        let config = Config {
            model: ModelConfig {
                top_p: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("top_p"));
    }

    #[test]
    fn test_validate_config_zero_tokens() {
        let config = Config {
            model: ModelConfig {
                max_new_tokens: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_resolve_api_key_prefers_inline() {
        let model = ModelConfig {
            api_key: Some("inline".to_string()),
            api_key_env: "STACKAI_TEST_KEY_INLINE_UNUSED".to_string(),
            ..Default::default()
        };
        assert_eq!(model.resolve_api_key().as_deref(), Some("inline"));
    }

    #[test]
    fn test_resolve_api_key_from_env() {
        std::env::set_var("STACKAI_TEST_KEY_FROM_ENV", "env-key");
        let model = ModelConfig {
            api_key_env: "STACKAI_TEST_KEY_FROM_ENV".to_string(),
            ..Default::default()
        };
        assert_eq!(model.resolve_api_key().as_deref(), Some("env-key"));

        let blank = ModelConfig {
            api_key: Some("  ".to_string()),
            api_key_env: "STACKAI_TEST_KEY_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert_eq!(blank.resolve_api_key(), None);
    }

    #[test]
    fn test_redacted_hides_key() {
        let config = Config {
            model: ModelConfig {
                api_key: Some("secret".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(redacted(&config).model.api_key.as_deref(), Some("<redacted>"));
    }
}
