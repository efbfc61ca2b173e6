use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::{Cli, CliCommand};
use crate::error::{Error, Result};
use crate::prompts::{DEFAULT_CATEGORIES, DEFAULT_LANGUAGE};
use crate::relay::{DEFAULT_API_KEY_ENV, DEFAULT_BIND, RelayConfig};
use crate::transport::{
    AuthMode, DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    TransportConfig,
};

pub const DEFAULT_CONFIG_FILE: &str = "casegen.toml";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub endpoint_url: Option<String>,
    pub auth_mode: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub categories: Option<Vec<String>>,
    pub language: Option<String>,
    pub prompt_dir: Option<PathBuf>,
    pub api_key_env: Option<String>,
    pub relay: Option<RelayFile>,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RelayFile {
    pub upstream_url: Option<String>,
    pub api_key_env: Option<String>,
    pub bind: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub transport: TransportConfig,
    pub api_key_env: String,
    pub categories: Vec<String>,
    pub language: String,
    pub prompt_dir: Option<PathBuf>,
    pub relay: RelayConfig,
    pub bind: String,
}

impl Config {
    /// Load `--config` (must exist) or `casegen.toml` (optional), then apply
    /// CLI overrides and read API keys from the environment.
    pub fn load(cli: &Cli) -> Result<Self> {
        let file_config = match cli.config {
            Some(ref path) => read_config(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    read_config(path)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        let config = merge(file_config, cli, |name| std::env::var(name).ok())?;
        validate_merged(&config)?;
        Ok(config)
    }

    /// Direct mode cannot work without a key; relay mode never sends one.
    pub fn require_credentials(&self) -> Result<()> {
        if self.transport.auth_mode == AuthMode::Direct && self.transport.api_key.is_none() {
            return Err(Error::ConfigValidation(format!(
                "direct mode requires an API key in ${} (or use --auth-mode relay)",
                self.api_key_env
            )));
        }
        Ok(())
    }
}

fn read_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Err(Error::ConfigNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<ConfigFile> {
    let config: ConfigFile = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<()> {
    if let Some(ref mode) = config.auth_mode {
        validate_auth_mode(mode)?;
    }
    if let Some(temperature) = config.temperature
        && !(0.0..=2.0).contains(&temperature)
    {
        return Err(Error::ConfigValidation(format!(
            "temperature must be between 0 and 2 (got {temperature})"
        )));
    }
    if let Some(max_tokens) = config.max_tokens
        && max_tokens == 0
    {
        return Err(Error::ConfigValidation(
            "max_tokens must be > 0".to_string(),
        ));
    }
    if let Some(ref categories) = config.categories
        && categories.iter().all(|c| c.trim().is_empty())
    {
        return Err(Error::ConfigValidation(
            "categories must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_auth_mode(mode: &str) -> Result<AuthMode> {
    AuthMode::parse(mode).ok_or_else(|| {
        Error::ConfigValidation(format!(
            "unknown auth_mode: {mode} (expected: direct, relay)"
        ))
    })
}

fn validate_merged(config: &Config) -> Result<()> {
    if config.transport.endpoint_url.trim().is_empty() {
        return Err(Error::ConfigValidation(
            "endpoint_url must not be empty".to_string(),
        ));
    }
    if config.relay.upstream_url.trim().is_empty() {
        return Err(Error::ConfigValidation(
            "relay upstream_url must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Merge file values under CLI overrides. `env` resolves environment variables.
pub fn merge(file: ConfigFile, cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let auth_mode = match cli.auth_mode.as_deref().or(file.auth_mode.as_deref()) {
        Some(mode) => validate_auth_mode(mode)?,
        None => AuthMode::default(),
    };

    let api_key_env = cli
        .api_key_env
        .clone()
        .or(file.api_key_env)
        .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
    let api_key = env(&api_key_env).filter(|k| !k.trim().is_empty());

    let transport = TransportConfig {
        endpoint_url: cli
            .endpoint
            .clone()
            .or(file.endpoint_url)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        auth_mode,
        api_key,
        model: cli
            .model
            .clone()
            .or(file.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        temperature: file.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        max_tokens: file.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
    };

    let cli_categories = clean_categories(cli.command.categories());
    let categories = if !cli_categories.is_empty() {
        cli_categories
    } else {
        let from_file = clean_categories(&file.categories.unwrap_or_default());
        if from_file.is_empty() {
            DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
        } else {
            from_file
        }
    };

    let relay_file = file.relay.unwrap_or_default();
    let (cli_bind, cli_upstream) = match cli.command {
        CliCommand::Relay {
            ref bind,
            ref upstream,
        } => (bind.clone(), upstream.clone()),
        _ => (None, None),
    };
    let relay_key_env = cli
        .api_key_env
        .clone()
        .or(relay_file.api_key_env)
        .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
    let relay = RelayConfig {
        upstream_url: cli_upstream
            .or(relay_file.upstream_url)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        api_key: env(&relay_key_env).filter(|k| !k.trim().is_empty()),
        api_key_env: relay_key_env,
    };

    Ok(Config {
        transport,
        api_key_env,
        categories,
        language: cli
            .language
            .clone()
            .or(file.language)
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        prompt_dir: cli.prompt_dir.clone().or(file.prompt_dir),
        relay,
        bind: cli_bind
            .or(relay_file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string()),
    })
}

fn clean_categories(categories: &[String]) -> Vec<String> {
    categories
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
