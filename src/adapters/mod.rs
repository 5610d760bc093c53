// Adapters layer: concrete implementations for external systems (filesystem, Telegram HTTP API).

pub mod storage;
pub mod telegram;

pub use storage::LocalStorage;
pub use telegram::TelegramClient;
