use super::Result;
use crate::api::client::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};
use crate::embed::config::{DEFAULT_WIDGET_TITLE, Position, Theme, WidgetConfig};
use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const API_URL_ENV: &str = "MODSTACK_API_URL";
const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR_NAME: &str = "modstack-relay";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub api_url: Option<String>,
    pub site_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub widget: WidgetSettings,
}

/// Site-wide floating widget options
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WidgetSettings {
    pub enabled: bool,
    pub chatbot_id: String,
    pub theme: Theme,
    pub position: Position,
    pub title: String,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            chatbot_id: String::new(),
            theme: Theme::default(),
            position: Position::default(),
            title: DEFAULT_WIDGET_TITLE.to_string(),
        }
    }
}

impl Config {
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        toml::from_str(&content).map_err(|e| StorageError::ConfigParseError {
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = match path {
            Some(p) => p,
            None => Self::config_file_path()?,
        };

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::FileIo {
                path: parent.to_string_lossy().to_string(),
                source,
            })?;
        }

        let toml_content =
            toml::to_string(self).map_err(|e| StorageError::ConfigParseError {
                message: e.to_string(),
            })?;

        fs::write(&config_path, toml_content).map_err(|source| StorageError::FileIo {
            path: config_path.to_string_lossy().to_string(),
            source,
        })?;

        Ok(())
    }

    /// `~/.config/modstack-relay/config.toml` (platform config dir)
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(StorageError::ConfigDirNotFound)?;
        Ok(config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn file_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }

    /// CLI flag > `MODSTACK_API_URL` > config file > default
    pub fn get_api_url(&self, cli_url: Option<&str>) -> String {
        self.resolve_api_url(cli_url, env::var(API_URL_ENV).ok())
    }

    pub(crate) fn resolve_api_url(&self, cli_url: Option<&str>, env_url: Option<String>) -> String {
        let non_empty = |s: &str| !s.trim().is_empty();

        cli_url
            .filter(|s| non_empty(s))
            .map(str::to_string)
            .or(env_url.filter(|s| non_empty(s)))
            .or(self.api_url.clone().filter(|s| non_empty(s)))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim()
            .to_string()
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_seconds
            .filter(|t| *t > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// The global widget to install, if it is enabled and has a chatbot
    pub fn widget_config(&self) -> Option<WidgetConfig> {
        let widget = &self.widget;
        if !widget.enabled || widget.chatbot_id.trim().is_empty() {
            return None;
        }

        Some(
            WidgetConfig::new(widget.chatbot_id.trim())
                .with_theme(widget.theme)
                .with_position(widget.position)
                .with_title(widget.title.as_str()),
        )
    }
}
