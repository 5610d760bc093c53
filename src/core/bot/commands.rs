use super::{player_from, QuizBot};
use crate::core::conversation::{Dialog, DraftMode};
use crate::core::keyboards;
use crate::core::messages;
use crate::core::quiz::QuizRequest;
use crate::domain::ports::{BotApi, Storage};
use crate::domain::telegram::{Message, SendMessage, User};
use crate::utils::error::Result;

impl<A: BotApi + 'static, S: Storage + 'static> QuizBot<A, S> {
    pub(super) async fn handle_command(
        &self,
        message: &Message,
        user: &User,
        command: &str,
        args: &[String],
    ) -> Result<()> {
        let chat_id = message.chat.id;
        let key = (chat_id, user.id);

        match command {
            "start" => {
                self.users.register(&player_from(user)).await?;
                self.reply(chat_id, messages::welcome(&user.first_name)).await?;
            }
            "help" => {
                self.api
                    .send_message(SendMessage::text(chat_id, messages::HELP_TEXT).markdown())
                    .await?;
            }
            "quiz" => self.quiz_command(chat_id, user, args).await?,
            "category" => {
                let categories = self.questions.categories().await?;
                if categories.is_empty() {
                    self.reply(chat_id, messages::NO_QUESTIONS).await?;
                } else {
                    self.reply_with_keyboard(
                        chat_id,
                        "📂 Select a category for your quiz:",
                        keyboards::quiz_categories(&categories),
                    )
                    .await?;
                }
            }
            "add" => {
                self.sessions
                    .set_dialog(key, Dialog::QuestionText { mode: DraftMode::Add });
                self.reply(chat_id, messages::ASK_QUESTION_TEXT).await?;
            }
            "edit" => {
                let questions = self.questions.load().await?;
                if questions.is_empty() {
                    self.reply(chat_id, "No questions available to edit.").await?;
                } else {
                    self.reply_chunked(chat_id, &messages::edit_list(&questions))
                        .await?;
                    let ids = questions.iter().map(|q| q.id).collect();
                    self.sessions.set_dialog(key, Dialog::EditSelect { ids });
                }
            }
            "delete" => {
                let questions = self.questions.load().await?;
                if questions.is_empty() {
                    self.reply(chat_id, "No questions available to delete.").await?;
                } else {
                    self.reply_with_keyboard(
                        chat_id,
                        "Select a question to delete:",
                        keyboards::delete_keyboard(&questions),
                    )
                    .await?;
                }
            }
            "list" => {
                let questions = self.questions.load().await?;
                self.reply_chunked(chat_id, &messages::question_list(&questions))
                    .await?;
            }
            "stats" | "mystats" => {
                let stats = self.users.get(user.id).await?;
                self.reply(chat_id, messages::stats(&user.first_name, &stats))
                    .await?;
            }
            "leaderboard" => {
                let entries = self.users.leaderboard(self.settings.leaderboard_size).await?;
                let total = self.users.count().await?;
                self.reply(chat_id, messages::leaderboard(&entries, total)).await?;
            }
            "clone" => {
                self.reply_with_keyboard(chat_id, messages::CLONE_MENU, keyboards::clone_methods())
                    .await?;
            }
            "poll2q" => self.poll2q_command(message, user, args).await?,
            "cancel" => {
                let text = if self.sessions.reset(key) {
                    messages::CANCELLED
                } else {
                    messages::NOTHING_TO_CANCEL
                };
                self.reply(chat_id, text).await?;
            }
            other => tracing::debug!("Ignoring unknown command /{}", other),
        }
        Ok(())
    }

    async fn quiz_command(&self, chat_id: i64, user: &User, args: &[String]) -> Result<()> {
        let running = self.registry().is_active(chat_id);
        if running {
            self.reply(chat_id, messages::QUIZ_ALREADY_RUNNING).await?;
            return Ok(());
        }

        let (request, warnings) = QuizRequest::parse(args, &self.settings);
        for warning in warnings {
            self.reply(chat_id, format!("⚠️ {}", warning)).await?;
        }

        let summary = request.summary();
        self.sessions.set_pending_quiz((chat_id, user.id), request);
        self.reply_with_keyboard(
            chat_id,
            format!("{}\n\n⏱️ Select time for each question:", summary),
            keyboards::timer_keyboard(&self.settings.timer_options),
        )
        .await?;
        Ok(())
    }
}
