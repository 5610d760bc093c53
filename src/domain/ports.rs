use crate::domain::telegram::{EditMessageText, Message, SendMessage, SendPoll, Update};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Telegram Bot API 的抽象，方便在測試中替換
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>>;
    async fn send_message(&self, request: SendMessage) -> Result<Message>;
    async fn edit_message_text(&self, request: EditMessageText) -> Result<()>;
    async fn send_poll(&self, request: SendPoll) -> Result<Message>;
    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()>;
}
