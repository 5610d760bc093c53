//! Telegram 更新的分派與各指令、對話、按鈕處理

mod callbacks;
mod commands;
mod dialogs;
mod poll_import;
mod quiz_flow;

use crate::config::{AppConfig, QuizSettings};
use crate::core::conversation::SessionStore;
use crate::core::importer::QuizImporter;
use crate::core::messages;
use crate::core::quiz::QuizRegistry;
use crate::core::{QuestionStore, Stores, UserStore};
use crate::domain::model::Player;
use crate::domain::ports::{BotApi, Storage};
use crate::domain::telegram::{
    EditMessageText, InlineKeyboardMarkup, Message, SendMessage, Update, User,
};
use crate::utils::error::Result;
use std::sync::{Arc, Mutex, MutexGuard};

pub struct QuizBot<A: BotApi + 'static, S: Storage + 'static> {
    api: Arc<A>,
    questions: Arc<QuestionStore<S>>,
    users: Arc<UserStore<S>>,
    sessions: Arc<SessionStore>,
    quizzes: Arc<Mutex<QuizRegistry>>,
    importer: Arc<QuizImporter>,
    settings: Arc<QuizSettings>,
}

impl<A: BotApi + 'static, S: Storage + 'static> Clone for QuizBot<A, S> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            questions: self.questions.clone(),
            users: self.users.clone(),
            sessions: self.sessions.clone(),
            quizzes: self.quizzes.clone(),
            importer: self.importer.clone(),
            settings: self.settings.clone(),
        }
    }
}

/// 顯示用名稱：名字加上姓氏（若有）
pub fn player_from(user: &User) -> Player {
    let name = match &user.last_name {
        Some(last) if !last.is_empty() => format!("{} {}", user.first_name, last),
        _ => user.first_name.clone(),
    };
    Player {
        id: user.id,
        name,
        username: user.username.clone(),
    }
}

impl<A: BotApi + 'static, S: Storage + 'static> QuizBot<A, S> {
    pub fn new(api: Arc<A>, stores: Stores<S>, config: &AppConfig) -> Result<Self> {
        Ok(Self {
            api,
            questions: stores.questions,
            users: stores.users,
            sessions: Arc::new(SessionStore::new()),
            quizzes: Arc::new(Mutex::new(QuizRegistry::new())),
            importer: Arc::new(QuizImporter::new(&config.import)?),
            settings: Arc::new(config.quiz.clone()),
        })
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// 目前進行中的測驗數量
    pub fn active_quizzes(&self) -> usize {
        self.registry().active_count()
    }

    // 不可跨越 await 持有
    fn registry(&self) -> MutexGuard<'_, QuizRegistry> {
        self.quizzes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 處理單一更新；錯誤只記錄，不中斷輪詢
    pub async fn handle_update(&self, update: Update) {
        let update_id = update.update_id;
        let result = if let Some(message) = update.message {
            self.handle_message(message).await
        } else if let Some(query) = update.callback_query {
            self.handle_callback(query).await
        } else if let Some(answer) = update.poll_answer {
            self.handle_poll_answer(answer).await
        } else {
            tracing::debug!("Skipping update {} with no supported payload", update_id);
            Ok(())
        };

        if let Err(e) = result {
            tracing::error!(
                "❌ Failed to handle update {}: {} (Category: {:?})",
                update_id,
                e,
                e.category()
            );
        }
    }

    async fn handle_message(&self, message: Message) -> Result<()> {
        let Some(user) = message.from.clone() else {
            return Ok(());
        };
        let key = (message.chat.id, user.id);

        if let Some((command, args)) = message.command() {
            tracing::info!("📨 /{} from {} in chat {}", command, user.id, message.chat.id);
            if command != "cancel" {
                self.sessions.clear_dialog(key);
            }
            return self.handle_command(&message, &user, &command, &args).await;
        }

        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        match self.sessions.dialog(key) {
            Some(dialog) => self.handle_dialog(message.chat.id, &user, dialog, text).await,
            None => Ok(()),
        }
    }

    async fn reply(&self, chat_id: i64, text: impl Into<String>) -> Result<Message> {
        self.api.send_message(SendMessage::text(chat_id, text)).await
    }

    /// 超過 Telegram 上限的文字依行拆成多則依序送出
    async fn reply_chunked(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in messages::split_message(text, messages::MAX_MESSAGE_CHARS) {
            self.reply(chat_id, chunk).await?;
        }
        Ok(())
    }

    async fn reply_with_keyboard(
        &self,
        chat_id: i64,
        text: impl Into<String>,
        keyboard: InlineKeyboardMarkup,
    ) -> Result<Message> {
        self.api
            .send_message(SendMessage::text(chat_id, text).keyboard(keyboard))
            .await
    }

    async fn edit(
        &self,
        chat_id: i64,
        message_id: i64,
        text: impl Into<String>,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut request = EditMessageText::text(chat_id, message_id, text);
        if let Some(keyboard) = keyboard {
            request = request.keyboard(keyboard);
        }
        self.api.edit_message_text(request).await
    }
}
