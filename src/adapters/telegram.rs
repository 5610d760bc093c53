use crate::config::TelegramConfig;
use crate::domain::ports::BotApi;
use crate::domain::telegram::{
    AnswerCallbackQuery, ApiResponse, EditMessageText, GetUpdates, Message, SendMessage, SendPoll,
    Update,
};
use crate::utils::error::{BotError, Result};
use crate::utils::validation::validate_required_field;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// 以 reqwest 實作的 Telegram Bot API 客戶端
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

// base_url 內含 bot token，不可出現在日誌中
impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let token = validate_required_field("telegram.bot_token", &config.bot_token)?;
        let client = Client::builder()
            .user_agent(concat!("quiz-bot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", config.api_base.trim_end_matches('/'), token),
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        tracing::debug!("Calling Telegram method {}", method);

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Telegram {} response status: {}", method, status);

        // Telegram 在錯誤時同樣回傳 JSON 包裝
        let envelope: ApiResponse<T> = response.json().await?;

        if envelope.ok {
            envelope.result.ok_or_else(|| BotError::TelegramApiError {
                code: i64::from(status.as_u16()),
                description: format!("{} returned ok without a result", method),
                retry_after: None,
            })
        } else {
            Err(BotError::TelegramApiError {
                code: envelope
                    .error_code
                    .unwrap_or_else(|| i64::from(status.as_u16())),
                description: envelope
                    .description
                    .unwrap_or_else(|| "unknown error".to_string()),
                retry_after: envelope.parameters.and_then(|p| p.retry_after),
            })
        }
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let request = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec![
                "message".to_string(),
                "callback_query".to_string(),
                "poll_answer".to_string(),
            ],
        };
        // 長輪詢：HTTP 逾時必須大於 Telegram 端的等待時間
        let timeout = Duration::from_secs(timeout_secs) + self.request_timeout;
        self.call("getUpdates", &request, timeout).await
    }

    async fn send_message(&self, request: SendMessage) -> Result<Message> {
        self.call("sendMessage", &request, self.request_timeout)
            .await
    }

    async fn edit_message_text(&self, request: EditMessageText) -> Result<()> {
        let _: serde_json::Value = self
            .call("editMessageText", &request, self.request_timeout)
            .await?;
        Ok(())
    }

    async fn send_poll(&self, request: SendPoll) -> Result<Message> {
        self.call("sendPoll", &request, self.request_timeout).await
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let request = AnswerCallbackQuery {
            callback_query_id: callback_query_id.to_string(),
            text: None,
        };
        let _: bool = self
            .call("answerCallbackQuery", &request, self.request_timeout)
            .await?;
        Ok(())
    }
}
