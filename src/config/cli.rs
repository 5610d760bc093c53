use crate::config::{AppConfig, ExecutionMode};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "quiz-bot")]
#[command(about = "Telegram quiz bot with a keep-alive web server")]
pub struct CliArgs {
    /// Path to an optional TOML configuration file
    #[arg(short, long, env = "QUIZ_BOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override EXECUTION_MODE (bot, web, combined)
    #[arg(long)]
    pub mode: Option<ExecutionMode>,

    /// Override the data directory (DATA_DIR)
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Override the web server port (PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

impl CliArgs {
    /// 命令列參數擁有最高優先權
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(mode) = self.mode {
            config.execution_mode = mode;
            tracing::info!("🔧 Execution mode overridden to: {}", mode);
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(port) = self.port {
            config.web.port = port;
        }
    }
}
