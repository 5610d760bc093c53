pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;
pub use config::{AppConfig, ExecutionMode};

pub use adapters::{LocalStorage, TelegramClient};
pub use core::{BotEngine, QuizBot, Stores};
pub use utils::error::{BotError, Result};
