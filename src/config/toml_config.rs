use crate::config::AppConfig;
use crate::utils::error::{BotError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub bot: Option<BotSection>,
    pub telegram: Option<TelegramSection>,
    pub web: Option<WebSection>,
    pub quiz: Option<QuizSection>,
    pub import: Option<ImportSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotSection {
    pub execution_mode: Option<String>,
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramSection {
    pub bot_token: Option<String>,
    pub api_base: Option<String>,
    pub poll_timeout_seconds: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
    pub retry_delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizSection {
    pub default_question_count: Option<usize>,
    pub max_question_count: Option<usize>,
    pub timer_options: Option<Vec<u64>>,
    pub grace_seconds: Option<u64>,
    pub negative_marking: Option<f64>,
    pub leaderboard_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSection {
    pub timeout_seconds: Option<u64>,
    pub allowed_hosts: Option<Vec<String>>,
    pub user_agent: Option<String>,
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 使用正規表達式匹配 ${VAR_NAME} 格式
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BotError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${TELEGRAM_BOT_TOKEN})；找不到的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        placeholder_regex()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    fn resolved(field: &str, value: &Option<String>) -> Option<String> {
        let value = value.as_ref()?;
        if placeholder_regex().is_match(value) {
            tracing::warn!("⚠️ {} references an unset environment variable, ignoring", field);
            return None;
        }
        Some(value.clone())
    }

    /// 將檔案中有設定的欄位覆蓋到 AppConfig
    pub fn apply_to(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(bot) = &self.bot {
            if let Some(mode) = Self::resolved("bot.execution_mode", &bot.execution_mode) {
                config.execution_mode = mode.parse()?;
            }
            if let Some(dir) = Self::resolved("bot.data_dir", &bot.data_dir) {
                config.data_dir = dir;
            }
        }

        if let Some(telegram) = &self.telegram {
            if let Some(token) = Self::resolved("telegram.bot_token", &telegram.bot_token) {
                config.telegram.bot_token = Some(token);
            }
            if let Some(api_base) = Self::resolved("telegram.api_base", &telegram.api_base) {
                config.telegram.api_base = api_base;
            }
            if let Some(v) = telegram.poll_timeout_seconds {
                config.telegram.poll_timeout_seconds = v;
            }
            if let Some(v) = telegram.request_timeout_seconds {
                config.telegram.request_timeout_seconds = v;
            }
            if let Some(v) = telegram.retry_delay_seconds {
                config.telegram.retry_delay_seconds = v;
            }
        }

        if let Some(web) = &self.web {
            if let Some(host) = Self::resolved("web.host", &web.host) {
                config.web.host = host;
            }
            if let Some(port) = web.port {
                config.web.port = port;
            }
        }

        if let Some(quiz) = &self.quiz {
            let target = &mut config.quiz;
            if let Some(v) = quiz.default_question_count {
                target.default_question_count = v;
            }
            if let Some(v) = quiz.max_question_count {
                target.max_question_count = v;
            }
            if let Some(v) = &quiz.timer_options {
                target.timer_options = v.clone();
            }
            if let Some(v) = quiz.grace_seconds {
                target.grace_seconds = v;
            }
            if let Some(v) = quiz.negative_marking {
                target.negative_marking = v;
            }
            if let Some(v) = quiz.leaderboard_size {
                target.leaderboard_size = v;
            }
        }

        if let Some(import) = &self.import {
            if let Some(v) = import.timeout_seconds {
                config.import.timeout_seconds = v;
            }
            if let Some(v) = &import.allowed_hosts {
                config.import.allowed_hosts = v.clone();
            }
            if let Some(v) = Self::resolved("import.user_agent", &import.user_agent) {
                config.import.user_agent = v;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExecutionMode;
    use crate::utils::error::{ErrorCategory, ErrorSeverity};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_partial_toml_config() {
        let toml_content = r#"
[bot]
execution_mode = "bot"
data_dir = "/app/data"

[quiz]
timer_options = [10, 20, 60]
negative_marking = 0.5
"#;

        let parsed = TomlConfig::from_toml_str(toml_content).unwrap();
        let mut config = AppConfig::new();
        parsed.apply_to(&mut config).unwrap();

        assert_eq!(config.execution_mode, ExecutionMode::Bot);
        assert_eq!(config.data_dir, "/app/data");
        assert_eq!(config.quiz.timer_options, vec![10, 20, 60]);
        assert_eq!(config.quiz.negative_marking, 0.5);
        // 未設定的欄位保留預設值
        assert_eq!(config.web.port, 8080);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("QUIZ_BOT_TEST_API_BASE", "http://localhost:8081");

        let toml_content = r#"
[telegram]
api_base = "${QUIZ_BOT_TEST_API_BASE}"
bot_token = "${QUIZ_BOT_TEST_UNSET_TOKEN}"
"#;

        let parsed = TomlConfig::from_toml_str(toml_content).unwrap();
        let mut config = AppConfig::new();
        parsed.apply_to(&mut config).unwrap();

        assert_eq!(config.telegram.api_base, "http://localhost:8081");
        assert!(config.telegram.bot_token.is_none());

        std::env::remove_var("QUIZ_BOT_TEST_API_BASE");
    }

    #[test]
    fn test_invalid_mode_in_file() {
        let parsed = TomlConfig::from_toml_str("[bot]\nexecution_mode = \"sideways\"\n").unwrap();
        let mut config = AppConfig::new();
        assert!(parsed.apply_to(&mut config).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[web]\nhost = \"127.0.0.1\"\nport = 3000\n")
            .unwrap();

        let parsed = TomlConfig::from_file(temp_file.path()).unwrap();
        let mut config = AppConfig::new();
        parsed.apply_to(&mut config).unwrap();
        assert_eq!(config.web.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_malformed_toml() {
        let error = TomlConfig::from_toml_str("[web\nport = 1").unwrap_err();
        assert!(matches!(error, BotError::TomlError(_)));
        assert_eq!(error.category(), ErrorCategory::Configuration);
        assert_eq!(error.severity(), ErrorSeverity::Critical);
        assert_eq!(error.recovery_suggestion(), "Fix the syntax of the TOML configuration file");
    }
}
