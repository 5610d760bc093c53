pub mod bot;
pub mod callbacks;
pub mod conversation;
pub mod engine;
pub mod importer;
pub mod keyboards;
pub mod messages;
pub mod polling;
pub mod question_store;
pub mod quiz;
pub mod user_store;

pub use crate::domain::ports::{BotApi, Storage};
pub use crate::utils::error::Result;
pub use bot::QuizBot;
pub use engine::BotEngine;
pub use question_store::QuestionStore;
pub use user_store::UserStore;

use std::sync::Arc;

/// 題庫與使用者統計；bot 與 web server 共用同一份
pub struct Stores<S: Storage> {
    pub questions: Arc<QuestionStore<S>>,
    pub users: Arc<UserStore<S>>,
}

impl<S: Storage> Stores<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            questions: Arc::new(QuestionStore::new(storage.clone())),
            users: Arc::new(UserStore::new(storage)),
        }
    }
}

impl<S: Storage> Clone for Stores<S> {
    fn clone(&self) -> Self {
        Self {
            questions: self.questions.clone(),
            users: self.users.clone(),
        }
    }
}
