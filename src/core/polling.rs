use crate::config::TelegramConfig;
use crate::core::QuizBot;
use crate::domain::ports::{BotApi, Storage};
use crate::utils::error::{ErrorSeverity, Result};
use std::time::Duration;
use tokio::sync::watch;

/// getUpdates 長輪詢；offset 在處理每個更新後前進
pub struct Poller<A: BotApi + 'static, S: Storage + 'static> {
    bot: QuizBot<A, S>,
    poll_timeout: u64,
    retry_delay: Duration,
}

impl<A: BotApi + 'static, S: Storage + 'static> Poller<A, S> {
    pub fn new(bot: QuizBot<A, S>, config: &TelegramConfig) -> Self {
        Self {
            bot,
            poll_timeout: config.poll_timeout_seconds,
            retry_delay: Duration::from_secs(config.retry_delay_seconds),
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let api = self.bot.api().clone();
        let mut offset: i64 = 0;
        tracing::info!("🤖 Telegram bot polling started");

        loop {
            let stopping = *shutdown.borrow();
            if stopping {
                break;
            }
            let result = tokio::select! {
                _ = shutdown.changed() => break,
                result = api.get_updates(offset, self.poll_timeout) => result,
            };

            match result {
                Ok(updates) => {
                    if !updates.is_empty() {
                        tracing::debug!("📬 Received {} updates", updates.len());
                    }
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        self.bot.handle_update(update).await;
                    }
                }
                Err(e) if e.severity() == ErrorSeverity::Critical => {
                    tracing::error!("❌ getUpdates failed permanently: {}", e);
                    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                    return Err(e);
                }
                Err(e) => {
                    let delay = e
                        .retry_after()
                        .map(Duration::from_secs)
                        .unwrap_or(self.retry_delay);
                    tracing::warn!(
                        "⚠️ getUpdates failed: {} (retrying in {:?}, retryable: {})",
                        e,
                        delay,
                        e.is_retryable()
                    );
                    tokio::select! {
                        _ = shutdown.changed() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        tracing::info!("🛑 Telegram bot polling stopped");
        Ok(())
    }
}
