//! Configuration file support

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use vision_ai::DEFAULT_API_URL;

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "VISION_CONFIG_PATH";
/// Environment variable overriding the backend base URL
pub const API_URL_ENV: &str = "VISION_API_URL";

/// Configuration for vision
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL (`/chat` is appended)
    pub api_url: Option<String>,
    /// Whether to use TUI mode by default
    pub tui: Option<bool>,
    /// Write logs to this file
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vision")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from the default location
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Create a default config file at `path` if it doesn't exist
    pub fn init_at(path: &Path) -> std::io::Result<PathBuf> {
        if !path.exists() {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::write(path, example_config())?;
        }
        Ok(path.to_path_buf())
    }

    /// Create a default config file at the default location
    pub fn init() -> std::io::Result<PathBuf> {
        Self::init_at(&Self::config_path())
    }

    /// Backend URL from flag, environment, then this config
    pub fn api_url(&self, flag: Option<&str>) -> String {
        let env = std::env::var(API_URL_ENV).ok();
        resolve_api_url(flag, env.as_deref(), self.api_url.as_deref())
    }
}

/// Pick the backend URL: flag > environment > config file > default.
///
/// Blank values are skipped.
pub fn resolve_api_url(flag: Option<&str>, env: Option<&str>, file: Option<&str>) -> String {
    [flag, env, file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .unwrap_or(DEFAULT_API_URL)
        .to_string()
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# vision configuration file
# Place at ~/.config/vision/config.toml (Linux) or set VISION_CONFIG_PATH

# Chat backend base URL; requests go to <api_url>/chat
# VISION_API_URL and --api-url take precedence
api_url = "http://127.0.0.1:8000"

# Whether to use TUI mode by default (true by default)
# Set to false for simple stdin/stdout mode
tui = true

# Write logs to a file (optional). Without it, logs are discarded in TUI mode
# log_file = "/tmp/vision.log"
"#
}
