use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Telegram API error {code}: {description}")]
    TelegramApiError {
        code: i64,
        description: String,
        retry_after: Option<u64>,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Not found: {what}")]
    NotFoundError { what: String },

    #[error("Server error: {message}")]
    ServerError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    TelegramApi,
    Configuration,
    Storage,
    Validation,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BotError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BotError::HttpError(_) => ErrorCategory::Network,
            BotError::TelegramApiError { .. } => ErrorCategory::TelegramApi,
            BotError::TomlError(_)
            | BotError::ConfigError { .. }
            | BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            BotError::IoError(_)
            | BotError::SerializationError(_)
            | BotError::StorageError { .. } => ErrorCategory::Storage,
            BotError::ValidationError { .. } | BotError::NotFoundError { .. } => {
                ErrorCategory::Validation
            }
            BotError::ServerError { .. } => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BotError::ValidationError { .. } | BotError::NotFoundError { .. } => {
                ErrorSeverity::Low
            }
            BotError::HttpError(_) => ErrorSeverity::Medium,
            // 429 與 5xx 屬於暫時性錯誤
            BotError::TelegramApiError { code, .. } if *code == 429 || *code >= 500 => {
                ErrorSeverity::Medium
            }
            BotError::TelegramApiError { code, .. } if *code == 401 || *code == 404 => {
                ErrorSeverity::Critical
            }
            BotError::TelegramApiError { .. } => ErrorSeverity::High,
            BotError::IoError(_)
            | BotError::SerializationError(_)
            | BotError::StorageError { .. } => ErrorSeverity::High,
            BotError::TomlError(_)
            | BotError::ConfigError { .. }
            | BotError::MissingConfigError { .. }
            | BotError::InvalidConfigValueError { .. }
            | BotError::ConfigValidationError { .. }
            | BotError::ServerError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 是否值得在稍後重試（輪詢迴圈使用）
    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Medium
    }

    pub fn retry_after(&self) -> Option<u64> {
        match self {
            BotError::TelegramApiError { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BotError::HttpError(_) => {
                "Check network connectivity to the Telegram API and retry".to_string()
            }
            BotError::TelegramApiError { code: 401, .. } => {
                "The bot token was rejected. Verify TELEGRAM_BOT_TOKEN with @BotFather".to_string()
            }
            BotError::TelegramApiError { code: 409, .. } => {
                "Another instance is polling with the same token. Stop it or remove the webhook"
                    .to_string()
            }
            BotError::TelegramApiError {
                retry_after: Some(secs),
                ..
            } => format!("Rate limited by Telegram, retry after {} seconds", secs),
            BotError::TelegramApiError { .. } => {
                "Inspect the Telegram error description and the request payload".to_string()
            }
            BotError::IoError(_) => {
                "Make sure the data directory exists and is writable".to_string()
            }
            BotError::SerializationError(_) | BotError::StorageError { .. } => {
                "Inspect the JSON files in the data directory; restore them from a backup if corrupted"
                    .to_string()
            }
            BotError::TomlError(_) => "Fix the syntax of the TOML configuration file".to_string(),
            BotError::MissingConfigError { field } => {
                format!("Provide a value for '{}' (environment variable, config file or flag)", field)
            }
            BotError::InvalidConfigValueError { field, .. }
            | BotError::ConfigValidationError { field, .. } => {
                format!("Correct the value of '{}' and restart", field)
            }
            BotError::ConfigError { .. } => "Review the configuration and restart".to_string(),
            BotError::ValidationError { .. } => "Check the input and try again".to_string(),
            BotError::NotFoundError { .. } => "Refresh the list and pick an existing item".to_string(),
            BotError::ServerError { .. } => {
                "Check that the port is free and the host address is valid".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the Telegram API: {}", self),
            ErrorCategory::TelegramApi => format!("Telegram rejected a request: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Storage => format!("Could not read or write bot data: {}", self),
            ErrorCategory::Validation => self.to_string(),
            ErrorCategory::Internal => format!("Internal error: {}", self),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        BotError::StorageError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        BotError::ValidationError {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telegram_error_classification() {
        let rate_limited = BotError::TelegramApiError {
            code: 429,
            description: "Too Many Requests: retry after 3".to_string(),
            retry_after: Some(3),
        };
        assert_eq!(rate_limited.category(), ErrorCategory::TelegramApi);
        assert_eq!(rate_limited.severity(), ErrorSeverity::Medium);
        assert!(rate_limited.is_retryable());
        assert_eq!(rate_limited.retry_after(), Some(3));

        let unauthorized = BotError::TelegramApiError {
            code: 401,
            description: "Unauthorized".to_string(),
            retry_after: None,
        };
        assert_eq!(unauthorized.severity(), ErrorSeverity::Critical);
        assert!(!unauthorized.is_retryable());
        assert!(unauthorized.recovery_suggestion().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = BotError::MissingConfigError {
            field: "telegram.bot_token".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
    }
}
