use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config directory not found")]
    NoConfigDir,
    #[error("config file not found at {0}")]
    NotFound(PathBuf),
    #[error("failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("validation failed: {0}")]
    ValidationError(String),
}

pub const EXAMPLE_CONFIG: &str = r#"
[catalog]
url = "http://localhost:3000"

[player]
command = "mpv"
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            page_size: default_page_size(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 {
    400
}

fn default_page_size() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per catalog call
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    500
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            command: default_player_command(),
            args: Vec::new(),
        }
    }
}

fn default_player_command() -> String {
    "mpv".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// Request headers the anime stream hosts expect
    #[serde(default = "default_anime_headers")]
    pub anime_headers: BTreeMap<String, String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            anime_headers: default_anime_headers(),
        }
    }
}

fn default_anime_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("origin".to_string(), "https://gogohd.net/".to_string()),
        ("referer".to_string(), "https://gogohd.net/".to_string()),
    ])
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.clone()));
        }

        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(contents)?;
        config.validate()?;
        // Strip trailing slash for consistency
        config.catalog.url = config.catalog.url.trim_end_matches('/').to_string();
        Ok(config)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        ProjectDirs::from("", "", "t3watch")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(ConfigError::NoConfigDir)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.url.is_empty() {
            return Err(ConfigError::ValidationError(
                "catalog.url cannot be empty".to_string(),
            ));
        }

        let url = url::Url::parse(&self.catalog.url)
            .map_err(|e| ConfigError::ValidationError(format!("catalog.url: {}", e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::ValidationError(
                "catalog.url must start with http:// or https://".to_string(),
            ));
        }

        if self.search.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "search.page_size must be at least 1".to_string(),
            ));
        }

        if self.retry.attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.attempts must be at least 1".to_string(),
            ));
        }

        if self.player.command.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "player.command cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
