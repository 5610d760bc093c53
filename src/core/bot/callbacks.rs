use super::{player_from, QuizBot};
use crate::core::callbacks::CallbackAction;
use crate::core::conversation::{Dialog, DraftMode};
use crate::core::keyboards;
use crate::core::messages;
use crate::core::quiz::QuizRequest;
use crate::domain::ports::{BotApi, Storage};
use crate::domain::telegram::CallbackQuery;
use crate::utils::error::Result;

impl<A: BotApi + 'static, S: Storage + 'static> QuizBot<A, S> {
    pub(super) async fn handle_callback(&self, query: CallbackQuery) -> Result<()> {
        // 先回應，避免按鈕持續顯示載入中
        if let Err(e) = self.api.answer_callback_query(&query.id).await {
            tracing::warn!("⚠️ Failed to answer callback query {}: {}", query.id, e);
        }

        let Some(data) = query.data.as_deref() else {
            return Ok(());
        };
        let action: CallbackAction = match data.parse() {
            Ok(action) => action,
            Err(e) => {
                tracing::warn!("⚠️ {}", e);
                return Ok(());
            }
        };
        let Some(message) = query.message.as_ref() else {
            tracing::debug!("Callback {} has no message attached", data);
            return Ok(());
        };

        let chat_id = message.chat.id;
        let message_id = message.message_id;
        let key = (chat_id, query.from.id);
        tracing::debug!("🔘 Callback {} from {} in chat {}", action, query.from.id, chat_id);

        match action {
            CallbackAction::Timer(seconds) => {
                if !self.settings.timer_options.contains(&seconds) {
                    tracing::warn!("⚠️ Rejecting unsupported timer {}s from {}", seconds, query.from.id);
                    self.edit(chat_id, message_id, messages::UNSUPPORTED_TIMER, None)
                        .await?;
                    return Ok(());
                }
                let request = self
                    .sessions
                    .take_pending_quiz(key)
                    .unwrap_or_else(|| QuizRequest::parse(&[], &self.settings).0);
                self.edit(
                    chat_id,
                    message_id,
                    format!("⏱️ Timer set to {} seconds per question.", seconds),
                    None,
                )
                .await?;
                self.start_quiz(chat_id, player_from(&query.from), request, seconds)
                    .await?;
            }
            CallbackAction::QuizCategory(index) => {
                let categories = self.questions.categories().await?;
                let Some(category) = categories.into_iter().nth(index) else {
                    self.edit(chat_id, message_id, "❌ Category not found. Use /category again.", None)
                        .await?;
                    return Ok(());
                };
                let text = format!("📂 Category: {}\n\n⏱️ Select time for each question:", category);
                self.sessions
                    .set_pending_quiz(key, QuizRequest::for_category(category, &self.settings));
                self.edit(
                    chat_id,
                    message_id,
                    text,
                    Some(keyboards::timer_keyboard(&self.settings.timer_options)),
                )
                .await?;
            }
            CallbackAction::QuestionCategory(category) => {
                let Some(Dialog::Category { mode, mut draft }) = self.sessions.dialog(key) else {
                    tracing::debug!("Category button pressed outside of a question dialog");
                    return Ok(());
                };
                self.edit(chat_id, message_id, format!("Category selected: {}", category), None)
                    .await?;
                draft.category = Some(category);
                self.finish_draft(chat_id, key, mode, draft).await?;
            }
            CallbackAction::Delete(id) => {
                let text = if self.questions.delete(id).await? {
                    "✅ Question deleted successfully."
                } else {
                    "❌ Question not found."
                };
                self.edit(chat_id, message_id, text, None).await?;
            }
            CallbackAction::DeleteCancel => {
                self.edit(chat_id, message_id, "Deletion cancelled.", None).await?;
            }
            CallbackAction::CloneUrl => {
                self.sessions.set_dialog(key, Dialog::CloneUrl);
                self.edit(chat_id, message_id, messages::CLONE_URL_PROMPT, None)
                    .await?;
            }
            CallbackAction::CloneManual => {
                self.sessions.set_dialog(
                    key,
                    Dialog::QuestionText {
                        mode: DraftMode::Clone,
                    },
                );
                self.edit(chat_id, message_id, messages::ASK_CLONE_QUESTION_TEXT, None)
                    .await?;
            }
            CallbackAction::PollAnswer(index) => {
                self.poll_answer_selected(chat_id, message_id, key, index).await?
            }
            CallbackAction::PollCategory(choice) => {
                self.poll_category_selected(chat_id, message_id, key, choice)
                    .await?
            }
            CallbackAction::PollIdAuto => self.save_pending_poll(chat_id, key, None).await?,
            CallbackAction::PollIdNext(id) | CallbackAction::PollIdUse(id) => {
                self.save_pending_poll(chat_id, key, Some(id)).await?
            }
            CallbackAction::PollIdCustom => {
                let questions = self.questions.load().await?;
                self.edit(
                    chat_id,
                    message_id,
                    "🔢 Choose an ID for this question:",
                    Some(keyboards::poll_id_menu(&questions)),
                )
                .await?;
            }
            CallbackAction::PollIdInput => {
                self.sessions.set_dialog(key, Dialog::PollCustomId);
                self.edit(chat_id, message_id, messages::ASK_CUSTOM_ID, None)
                    .await?;
            }
            CallbackAction::PollIdBrowse => {
                let questions = self.questions.load().await?;
                self.edit(
                    chat_id,
                    message_id,
                    "🔍 Existing question IDs:",
                    Some(keyboards::poll_id_browse(&questions)),
                )
                .await?;
            }
        }
        Ok(())
    }
}
