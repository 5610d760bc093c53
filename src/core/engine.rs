use crate::adapters::{LocalStorage, TelegramClient};
use crate::config::AppConfig;
use crate::core::polling::Poller;
use crate::core::{QuizBot, Stores};
use crate::server::{self, AppState};
use crate::utils::error::{BotError, Result};
use crate::utils::monitor::SystemMonitor;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// 依執行模式啟動 bot、web server 或兩者
pub struct BotEngine {
    config: AppConfig,
    monitor: Arc<SystemMonitor>,
}

impl BotEngine {
    pub fn new(config: AppConfig) -> Self {
        Self::new_with_monitoring(config, false)
    }

    pub fn new_with_monitoring(config: AppConfig, monitor_enabled: bool) -> Self {
        Self {
            config,
            monitor: Arc::new(SystemMonitor::new(monitor_enabled)),
        }
    }

    pub async fn run(self) -> Result<()> {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("❌ Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("🛑 Received Ctrl-C, shutting down");
        };
        self.run_until(ctrl_c).await
    }

    /// 任一任務結束或 `stop` 完成時，通知所有任務關閉並等待它們結束
    pub async fn run_until<F>(self, stop: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mode = self.config.execution_mode;
        tracing::info!("🚀 Starting quiz-bot in {} mode", mode);
        self.monitor.log_stats("Startup");

        let storage = Arc::new(LocalStorage::new(self.config.data_path()));
        storage.ensure_base_dir().await?;
        let stores = Stores::new(storage);
        let questions = stores.questions.count().await?;
        tracing::info!("📚 Question bank ready with {} questions", questions);

        let mut tasks: JoinSet<Result<()>> = JoinSet::new();

        if mode.runs_bot() {
            let api = Arc::new(TelegramClient::new(&self.config.telegram)?);
            let bot = QuizBot::new(api, stores.clone(), &self.config)?;
            let poller = Poller::new(bot, &self.config.telegram);
            tasks.spawn(poller.run(shutdown_rx.clone()));
        }

        if mode.runs_web() {
            let state = AppState {
                stores: stores.clone(),
                mode,
                leaderboard_size: self.config.quiz.leaderboard_size,
                monitor: self.monitor.clone(),
            };
            tasks.spawn(server::serve(
                state,
                self.config.web.bind_address(),
                shutdown_rx.clone(),
            ));
        }

        let result = tokio::select! {
            _ = stop => Ok(()),
            Some(joined) = tasks.join_next() => flatten(joined),
        };

        let _ = shutdown_tx.send(true);
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = flatten(joined) {
                tracing::error!("❌ Task failed during shutdown: {}", e);
            }
        }

        self.monitor.log_stats("Shutdown");
        if let Err(e) = &result {
            tracing::error!("❌ quiz-bot stopped with error: {}", e);
        }
        result
    }
}

fn flatten(joined: std::result::Result<Result<()>, tokio::task::JoinError>) -> Result<()> {
    joined.map_err(|e| BotError::ServerError {
        message: format!("task panicked or was cancelled: {}", e),
    })?
}
