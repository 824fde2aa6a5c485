use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::workflow::classification::DEFAULT_DEBOUNCE;
use crate::workflow::draft::MergePolicy;
use crate::workflow::listing::TransitionPolicy;

const CONFIG_DIR_NAME: &str = "deskflow";
const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_LOG_LEVEL: &str = "warn";

const ENV_API_URL: &str = "DESKFLOW_API_URL";
const ENV_TOKEN: &str = "DESKFLOW_TOKEN";
const ENV_LOG: &str = "DESKFLOW_LOG";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub access_token: Option<String>,
    pub log_level: String,
    pub debounce: Duration,
    pub merge_policy: MergePolicy,
    pub transition_policy: TransitionPolicy,
}

/// What `deskflow config init` writes to disk. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    pub api_base_url: Option<String>,
    pub access_token: Option<String>,
    pub log_level: Option<String>,
    pub debounce_ms: Option<String>,
    pub merge_policy: Option<String>,
    pub transition_policy: Option<String>,
}

pub fn config_directory() -> AppResult<PathBuf> {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir).join(CONFIG_DIR_NAME));
    }
    let home = env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .ok_or_else(|| AppError::Configuration("cannot locate home directory".to_string()))?;
    Ok(PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        let path = config_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    fn parse(contents: &str) -> AppResult<Self> {
        serde_json::from_str(contents)
            .map_err(|err| AppError::Configuration(format!("invalid config file: {err}")))
    }

    pub fn save(&self) -> AppResult<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(&path, data)?;
        Ok(())
    }
}

pub fn parse_debounce(raw: &str) -> AppResult<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| AppError::Configuration(format!("invalid debounce_ms '{raw}'")))
}

pub fn parse_merge_policy(raw: &str) -> AppResult<MergePolicy> {
    MergePolicy::from_str(raw)
        .ok_or_else(|| AppError::Configuration(format!("unknown merge policy '{raw}'")))
}

pub fn parse_transition_policy(raw: &str) -> AppResult<TransitionPolicy> {
    TransitionPolicy::from_str(raw)
        .ok_or_else(|| AppError::Configuration(format!("unknown transition policy '{raw}'")))
}

impl AppConfig {
    pub fn load() -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Self::resolve(stored, |key| env::var(key).ok())
    }

    /// Layers environment overrides on top of the stored file and defaults.
    fn resolve(stored: StoredConfig, env_lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let pick = |key: &str, stored: Option<String>| {
            env_lookup(key)
                .or(stored)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let debounce = match stored.debounce_ms.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_DEBOUNCE,
            Some(raw) => parse_debounce(raw)?,
        };
        let merge_policy = match stored.merge_policy.as_deref() {
            None => MergePolicy::default(),
            Some(raw) => parse_merge_policy(raw)?,
        };
        let transition_policy = match stored.transition_policy.as_deref() {
            None => TransitionPolicy::default(),
            Some(raw) => parse_transition_policy(raw)?,
        };

        Ok(Self {
            api_base_url: pick(ENV_API_URL, stored.api_base_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            access_token: pick(ENV_TOKEN, stored.access_token),
            log_level: pick(ENV_LOG, stored.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            debounce,
            merge_policy,
            transition_policy,
        })
    }
}
