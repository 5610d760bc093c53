#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::{BotError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[cfg(feature = "cli")]
pub use cli::CliArgs;
pub use toml_config::TomlConfig;

/// 執行模式：由 EXECUTION_MODE 環境變數決定
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Bot,
    Web,
    #[default]
    Combined,
}

impl ExecutionMode {
    pub fn runs_bot(self) -> bool {
        matches!(self, ExecutionMode::Bot | ExecutionMode::Combined)
    }

    pub fn runs_web(self) -> bool {
        matches!(self, ExecutionMode::Web | ExecutionMode::Combined)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Bot => "bot",
            ExecutionMode::Web => "web",
            ExecutionMode::Combined => "combined",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "bot" | "telegram" => Ok(ExecutionMode::Bot),
            "web" | "server" => Ok(ExecutionMode::Web),
            "combined" | "both" | "all" => Ok(ExecutionMode::Combined),
            other => Err(BotError::InvalidConfigValueError {
                field: "execution_mode".to_string(),
                value: other.to_string(),
                reason: "Expected one of: bot, web, combined".to_string(),
            }),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub api_base: String,
    pub poll_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
    pub retry_delay_seconds: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: "https://api.telegram.org".to_string(),
            poll_timeout_seconds: 30,
            request_timeout_seconds: 15,
            retry_delay_seconds: 5,
        }
    }
}

// token 不輸出到日誌
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("poll_timeout_seconds", &self.poll_timeout_seconds)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("retry_delay_seconds", &self.retry_delay_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl WebConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSettings {
    pub default_question_count: usize,
    pub max_question_count: usize,
    pub timer_options: Vec<u64>,
    pub grace_seconds: u64,
    pub negative_marking: f64,
    pub leaderboard_size: usize,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            default_question_count: 5,
            max_question_count: 10,
            timer_options: vec![15, 30],
            grace_seconds: 2,
            negative_marking: 0.25,
            leaderboard_size: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    pub timeout_seconds: u64,
    pub allowed_hosts: Vec<String>,
    pub user_agent: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 15,
            allowed_hosts: vec!["t.me".to_string(), "telegram.me".to_string()],
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub execution_mode: ExecutionMode,
    pub data_dir: String,
    pub telegram: TelegramConfig,
    pub web: WebConfig,
    pub quiz: QuizSettings,
    pub import: ImportConfig,
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            data_dir: "data".to_string(),
            ..Self::default()
        }
    }

    /// 依序套用：預設值 -> TOML 檔案 -> 環境變數
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = Self::new();

        if let Some(path) = config_file {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            TomlConfig::from_file(path)?.apply_to(&mut config)?;
        }

        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// 以自訂查詢函式套用環境變數（測試時不必修改行程環境）
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token.trim().to_string());
        }
        if let Some(mode) = non_empty("EXECUTION_MODE") {
            self.execution_mode = mode.parse()?;
        }
        if let Some(dir) = non_empty("DATA_DIR") {
            self.data_dir = dir;
        }
        if let Some(host) = non_empty("HOST") {
            self.web.host = host;
        }
        if let Some(port) = non_empty("PORT") {
            self.web.port = port.trim().parse().map_err(|_| BotError::InvalidConfigValueError {
                field: "PORT".to_string(),
                value: port.clone(),
                reason: "Port must be a number between 1 and 65535".to_string(),
            })?;
        }
        if let Some(api_base) = non_empty("TELEGRAM_API_BASE") {
            self.telegram.api_base = api_base;
        }

        Ok(())
    }

    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("data_dir", &self.data_dir)?;
        validate_url("telegram.api_base", &self.telegram.api_base)?;
        validate_non_empty_string("web.host", &self.web.host)?;
        validate_positive_number("web.port", usize::from(self.web.port), 1)?;

        if self.execution_mode.runs_bot() {
            validate_required_field("telegram.bot_token", &self.telegram.bot_token)?;
        }

        let quiz = &self.quiz;
        if quiz.timer_options.is_empty() {
            return Err(BotError::ConfigValidationError {
                field: "quiz.timer_options".to_string(),
                message: "At least one timer option is required".to_string(),
            });
        }
        for timer in &quiz.timer_options {
            // Telegram open_period 僅接受 5..=600 秒
            validate_range("quiz.timer_options", *timer, 5, 600)?;
        }
        validate_positive_number("quiz.max_question_count", quiz.max_question_count, 1)?;
        validate_range(
            "quiz.default_question_count",
            quiz.default_question_count,
            1,
            quiz.max_question_count,
        )?;
        validate_range("quiz.negative_marking", quiz.negative_marking, 0.0, 1.0)?;
        validate_positive_number("quiz.leaderboard_size", quiz.leaderboard_size, 1)?;
        validate_positive_number(
            "import.timeout_seconds",
            self.import.timeout_seconds as usize,
            1,
        )?;

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
