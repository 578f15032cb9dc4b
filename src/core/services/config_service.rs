use crate::AppError;
use crate::error::{CliError, ConfigError};
use crate::storage::config::Config;
use crate::utils::validation::validate_url;
use std::path::PathBuf;

/// User-facing setting names accepted by `set_field`
pub const SETTABLE_FIELDS: &[&str] = &[
    "api-url",
    "site-url",
    "timeout",
    "widget.enabled",
    "widget.chatbot",
    "widget.theme",
    "widget.position",
    "widget.title",
];

/// Configuration service for reading and updating the settings file
pub struct ConfigService {
    config: Config,
}

impl ConfigService {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Set one setting by its user-facing name, validating the value
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), AppError> {
        let value = value.trim();
        let invalid = |reason: &str| {
            AppError::Config(ConfigError::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
                reason: reason.to_string(),
            })
        };

        match field {
            "api-url" => {
                validate_url(value)?;
                self.config.api_url = Some(value.trim_end_matches('/').to_string());
            }
            "site-url" => {
                validate_url(value)?;
                self.config.site_url = Some(value.trim_end_matches('/').to_string());
            }
            "timeout" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|_| invalid("expected a whole number of seconds"))?;
                if secs == 0 {
                    return Err(invalid("timeout must be at least 1 second"));
                }
                self.config.timeout_seconds = Some(secs);
            }
            "widget.enabled" => {
                self.config.widget.enabled = value
                    .parse()
                    .map_err(|_| invalid("expected true or false"))?;
            }
            "widget.chatbot" => self.config.widget.chatbot_id = value.to_string(),
            "widget.theme" => {
                self.config.widget.theme = value.parse().map_err(|e: String| invalid(&e))?;
            }
            "widget.position" => {
                self.config.widget.position = value.parse().map_err(|e: String| invalid(&e))?;
            }
            "widget.title" => {
                if value.is_empty() {
                    return Err(invalid("title cannot be empty"));
                }
                self.config.widget.title = value.to_string();
            }
            _ => {
                return Err(AppError::Cli(CliError::InvalidArguments(format!(
                    "Unknown field: {}. Use one of: {}",
                    field,
                    SETTABLE_FIELDS.join(", ")
                ))));
            }
        }

        Ok(())
    }

    pub fn save_config(&self, path: Option<PathBuf>) -> Result<(), AppError> {
        self.config.save(path).map_err(|e| e.into())
    }
}
