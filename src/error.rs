use crate::api::models::DebugInfo;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("CliError: {0}")]
    Cli(#[from] CliError),
    #[error("ApiError: {0}")]
    Api(#[from] ApiError),
    #[error("WebhookError: {0}")]
    Webhook(#[from] WebhookError),
    #[error("EmbedError: {0}")]
    Embed(#[from] EmbedError),
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),
    #[error("StorageError: {0}")]
    Storage(#[from] StorageError),
    #[error("DisplayError: {0}")]
    Display(#[from] DisplayError),
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Failed to read input: {0}")]
    Input(String),
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(
        "Invalid ModStack API key format. Expected format: modstack_wp_[64-character hash]"
    )]
    InvalidKeyFormat { key_length: usize },
    #[error("Invalid URL format: {url}")]
    InvalidUrlFormat { url: String },
    #[error("API key not configured")]
    NotConfigured,
    #[error("Missing required parameter: {parameter}")]
    MissingParameter { parameter: String },
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64, endpoint: String },
    #[error("Connection failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("{message}")]
    Remote {
        status: u16,
        endpoint: String,
        message: String,
        debug: Option<Box<DebugInfo>>,
    },
    #[error("Failed to fetch {kind}")]
    FetchFailed { kind: String, status: u16 },
    #[error("Invalid connection status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl ApiError {
    /// Operator-only diagnostics attached to the error, if any.
    pub fn debug_info(&self) -> Option<&DebugInfo> {
        match self {
            ApiError::Remote { debug, .. } => debug.as_deref(),
            _ => None,
        }
    }

    /// True for errors raised before any network I/O happened.
    pub fn is_local_validation(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidKeyFormat { .. }
                | ApiError::InvalidUrlFormat { .. }
                | ApiError::MissingParameter { .. }
                | ApiError::NotConfigured
        )
    }
}

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Invalid webhook signature")]
    SignatureInvalid,
    #[error("Invalid webhook payload: {message}")]
    InvalidPayload { message: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbedError {
    #[error("{kind} ID is required")]
    MissingResourceId { kind: String },
    #[error("Invalid API URL for embed: {url}")]
    InvalidApiUrl { url: String },
    #[error("Widget has been destroyed")]
    Destroyed,
    #[error("No chatbot configured")]
    NotConfigured,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Keyring error: {0}")]
    KeyringError(String),
    #[error("File I/O error at {path}: {source}")]
    FileIo {
        path: String,
        source: std::io::Error,
    },
    #[error("Configuration parse error: {message}")]
    ConfigParseError { message: String },
    #[error("Configuration directory not found")]
    ConfigDirNotFound,
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Terminal output error: {0}")]
    TerminalOutput(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for '{field}': {value}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ErrorSeverity {
    pub fn emoji(&self) -> &'static str {
        match self {
            ErrorSeverity::Critical => "🚨",
            ErrorSeverity::High => "❌",
            ErrorSeverity::Medium => "⚠️",
            ErrorSeverity::Low => "ℹ️",
        }
    }
}

impl AppError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AppError::Cli(_) => ErrorSeverity::Medium,
            AppError::Api(api_error) => match api_error {
                ApiError::NotConfigured | ApiError::InvalidKeyFormat { .. } => ErrorSeverity::High,
                ApiError::Remote { status, .. } if *status >= 500 => ErrorSeverity::High,
                ApiError::Remote { status: 401 | 403, .. } => ErrorSeverity::High,
                _ => ErrorSeverity::Medium,
            },
            AppError::Webhook(WebhookError::SignatureInvalid) => ErrorSeverity::Critical,
            AppError::Webhook(_) => ErrorSeverity::Medium,
            AppError::Embed(_) => ErrorSeverity::Medium,
            AppError::Config(_) => ErrorSeverity::High,
            AppError::Storage(_) => ErrorSeverity::Medium,
            AppError::Display(_) => ErrorSeverity::Low,
        }
    }

    /// Message safe to show to any user. Debug payloads are never included.
    pub fn display_friendly(&self) -> String {
        match self {
            AppError::Api(ApiError::Remote { message, .. }) => message.clone(),
            AppError::Api(ApiError::FetchFailed { kind, .. }) => format!("Failed to fetch {}", kind),
            AppError::Api(ApiError::Timeout { .. }) => "Connection timeout".to_string(),
            AppError::Webhook(WebhookError::SignatureInvalid) => "Unauthorized".to_string(),
            _ => format!("{}", self),
        }
    }

    pub fn troubleshooting_hint(&self) -> Option<String> {
        match self {
            AppError::Api(ApiError::NotConfigured) => Some(
                "'modstack-cli config set-key' or set MODSTACK_API_KEY to configure your API key"
                    .to_string(),
            ),
            AppError::Api(ApiError::InvalidKeyFormat { .. }) => Some(
                "Copy the key from your ModStack dashboard; it starts with 'modstack_wp_'"
                    .to_string(),
            ),
            AppError::Api(ApiError::InvalidUrlFormat { .. }) => Some(
                "'modstack-cli config set --api-url <url>' with an absolute http(s) URL"
                    .to_string(),
            ),
            AppError::Api(ApiError::Timeout { .. } | ApiError::Transport { .. }) => {
                Some("Check your internet connection and the API URL, then try again".to_string())
            }
            AppError::Api(ApiError::Remote { status: 401 | 403, .. }) => {
                Some("'modstack-cli test-connection' to verify your API key".to_string())
            }
            AppError::Embed(EmbedError::MissingResourceId { .. }) => {
                Some("'modstack-cli list chatbots' to see available resource IDs".to_string())
            }
            AppError::Embed(EmbedError::NotConfigured) => Some(
                "'modstack-cli config set --widget-enabled true --chatbot <id>' to enable the site-wide widget"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let api_err = ApiError::MissingParameter {
            parameter: "message".to_string(),
        };
        assert_eq!(
            format!("{}", api_err),
            "Missing required parameter: message"
        );

        let api_err = ApiError::FetchFailed {
            kind: "modbots".to_string(),
            status: 500,
        };
        assert_eq!(format!("{}", api_err), "Failed to fetch modbots");

        let api_err = ApiError::Timeout {
            timeout_secs: 10,
            endpoint: "/test-connection".to_string(),
        };
        assert_eq!(format!("{}", api_err), "Request timed out after 10s");
    }

    #[test]
    fn test_remote_error_keeps_message_and_debug() {
        let api_err = ApiError::Remote {
            status: 401,
            endpoint: "/test-connection".to_string(),
            message: "Invalid API key".to_string(),
            debug: Some(Box::new(DebugInfo {
                status_code: 401,
                response_body: "{}".to_string(),
                api_url: "https://api.example.test/test-connection".to_string(),
                api_key_length: 76,
            })),
        };
        assert_eq!(format!("{}", api_err), "Invalid API key");
        let debug = api_err.debug_info().expect("debug info attached");
        assert_eq!(debug.status_code, 401);
        assert_eq!(debug.api_key_length, 76);
    }

    #[test]
    fn test_display_friendly_hides_debug_payload() {
        let app_err = AppError::Api(ApiError::Remote {
            status: 403,
            endpoint: "/test-connection".to_string(),
            message: "Forbidden".to_string(),
            debug: Some(Box::new(DebugInfo {
                status_code: 403,
                response_body: "secret body".to_string(),
                api_url: "https://api.example.test/test-connection".to_string(),
                api_key_length: 76,
            })),
        });
        let friendly = app_err.display_friendly();
        assert_eq!(friendly, "Forbidden");
        assert!(!friendly.contains("secret body"));
    }

    #[test]
    fn test_local_validation_classification() {
        assert!(ApiError::NotConfigured.is_local_validation());
        assert!(ApiError::InvalidKeyFormat { key_length: 3 }.is_local_validation());
        assert!(
            !ApiError::Transport {
                endpoint: "/modbots".to_string(),
                message: "refused".to_string(),
            }
            .is_local_validation()
        );
    }

    #[test]
    fn test_severity_and_hints() {
        let app_err = AppError::Webhook(WebhookError::SignatureInvalid);
        assert_eq!(app_err.severity(), ErrorSeverity::Critical);

        let app_err = AppError::Api(ApiError::NotConfigured);
        assert_eq!(app_err.severity(), ErrorSeverity::High);
        assert!(app_err.troubleshooting_hint().is_some());

        let app_err = AppError::Display(DisplayError::TerminalOutput("x".to_string()));
        assert_eq!(app_err.severity(), ErrorSeverity::Low);
        assert!(app_err.troubleshooting_hint().is_none());
    }

    #[test]
    fn test_embed_error_display() {
        let err = EmbedError::MissingResourceId {
            kind: "Modbot".to_string(),
        };
        assert_eq!(format!("{}", err), "Modbot ID is required");
        let app_err: AppError = err.into();
        assert_eq!(
            format!("{}", app_err),
            "EmbedError: Modbot ID is required"
        );
    }
}
