use super::QuizBot;
use crate::core::conversation::{parse_answer, parse_options, parse_positive_id, Dialog, DraftMode, EditField};
use crate::core::importer::normalize_url;
use crate::core::keyboards;
use crate::core::messages;
use crate::domain::model::{Question, QuestionDraft};
use crate::domain::ports::{BotApi, Storage};
use crate::domain::telegram::User;
use crate::utils::error::{BotError, Result};

const QUESTION_GONE: &str = "❌ That question no longer exists. Use /edit to start again.";

impl<A: BotApi + 'static, S: Storage + 'static> QuizBot<A, S> {
    pub(super) async fn handle_dialog(
        &self,
        chat_id: i64,
        user: &User,
        dialog: Dialog,
        text: &str,
    ) -> Result<()> {
        let key = (chat_id, user.id);
        let text = text.trim();

        match dialog {
            Dialog::QuestionText { mode } => {
                if text.is_empty() {
                    return Ok(());
                }
                let draft = QuestionDraft {
                    question: text.to_string(),
                    ..QuestionDraft::default()
                };
                self.sessions.set_dialog(key, Dialog::Options { mode, draft });
                self.reply(chat_id, messages::ASK_OPTIONS).await?;
            }
            Dialog::Options { mode, mut draft } => match parse_options(text) {
                Some(options) => {
                    let prompt = messages::ask_answer(&options);
                    draft.options = options;
                    self.sessions.set_dialog(key, Dialog::Answer { mode, draft });
                    self.reply(chat_id, prompt).await?;
                }
                None => {
                    self.reply(chat_id, messages::TOO_FEW_OPTIONS).await?;
                }
            },
            Dialog::Answer { mode, mut draft } => match parse_answer(text, draft.options.len()) {
                Some(answer) => {
                    draft.answer = Some(answer);
                    self.sessions.set_dialog(key, Dialog::Category { mode, draft });
                    self.reply_with_keyboard(
                        chat_id,
                        messages::ASK_CATEGORY,
                        keyboards::question_categories(),
                    )
                    .await?;
                }
                None => {
                    self.reply(chat_id, messages::answer_out_of_range(draft.options.len()))
                        .await?;
                }
            },
            Dialog::Category { mode, mut draft } => {
                if text.is_empty() {
                    return Ok(());
                }
                draft.category = Some(text.to_string());
                self.finish_draft(chat_id, key, mode, draft).await?;
            }
            Dialog::CloneUrl => self.clone_from_url(chat_id, key, text).await?,
            Dialog::EditSelect { ids } => {
                let Some(index) = parse_answer(text, ids.len()) else {
                    self.reply(chat_id, messages::answer_out_of_range(ids.len())).await?;
                    return Ok(());
                };
                let questions = self.questions.load().await?;
                match questions.get(index) {
                    Some(question) if question.id == ids[index] => {
                        let menu = messages::edit_menu(question);
                        self.sessions.set_dialog(
                            key,
                            Dialog::EditChooseField {
                                index,
                                question: question.clone(),
                            },
                        );
                        self.reply(chat_id, menu).await?;
                    }
                    _ => {
                        self.sessions.clear_dialog(key);
                        self.reply(chat_id, QUESTION_GONE).await?;
                    }
                }
            }
            Dialog::EditChooseField { index, question } => {
                let Some(field) = EditField::from_choice(text) else {
                    self.reply(chat_id, "Please enter a number between 1 and 4:").await?;
                    return Ok(());
                };
                let prompt = edit_prompt(&question, field);
                self.sessions.set_dialog(
                    key,
                    Dialog::EditValue {
                        index,
                        question,
                        field,
                    },
                );
                self.reply(chat_id, prompt).await?;
            }
            Dialog::EditValue {
                index,
                question,
                field,
            } => self.apply_edit(chat_id, key, index, question, field, text).await?,
            Dialog::PollCustomId => match parse_positive_id(text) {
                Some(id) => {
                    self.sessions.clear_dialog(key);
                    self.save_pending_poll(chat_id, key, Some(id)).await?;
                }
                None => {
                    self.reply(chat_id, messages::INVALID_CUSTOM_ID).await?;
                }
            },
        }
        Ok(())
    }

    /// 新增或手動複製的最後一步：以下一個可用 id 儲存
    pub(super) async fn finish_draft(
        &self,
        chat_id: i64,
        key: (i64, i64),
        mode: DraftMode,
        draft: QuestionDraft,
    ) -> Result<()> {
        self.sessions.clear_dialog(key);
        match self.questions.add_with_next_id(draft.into_question(0)).await {
            Ok(saved) => {
                self.reply(
                    chat_id,
                    messages::question_saved(&saved, mode == DraftMode::Clone),
                )
                .await?;
            }
            Err(e) => {
                tracing::error!("❌ Failed to save question: {}", e);
                self.reply(chat_id, messages::SAVE_FAILED).await?;
            }
        }
        Ok(())
    }

    async fn clone_from_url(&self, chat_id: i64, key: (i64, i64), text: &str) -> Result<()> {
        let Some(url) = normalize_url(text) else {
            self.reply(chat_id, messages::URL_FORMAT_HELP).await?;
            return Ok(());
        };

        let progress = self.reply(chat_id, messages::IMPORT_PROGRESS).await?;
        match self.importer.extract(&url).await {
            Some(quiz) => {
                let text = messages::imported(&quiz.question, &quiz.options);
                let draft = QuestionDraft {
                    question: quiz.question,
                    options: quiz.options,
                    ..QuestionDraft::default()
                };
                self.sessions.set_dialog(
                    key,
                    Dialog::Answer {
                        mode: DraftMode::Clone,
                        draft,
                    },
                );
                self.edit(chat_id, progress.message_id, text, None).await?;
            }
            None => {
                self.sessions.clear_dialog(key);
                self.edit(chat_id, progress.message_id, messages::IMPORT_FAILED, None)
                    .await?;
            }
        }
        Ok(())
    }

    async fn apply_edit(
        &self,
        chat_id: i64,
        key: (i64, i64),
        index: usize,
        question: Question,
        field: EditField,
        text: &str,
    ) -> Result<()> {
        let mut updated = question.clone();
        match field {
            EditField::Text | EditField::Category if text.is_empty() => return Ok(()),
            EditField::Text => updated.question = text.to_string(),
            EditField::Category => updated.category = text.to_string(),
            EditField::Options => {
                let Some(options) = parse_options(text) else {
                    self.reply(chat_id, messages::TOO_FEW_OPTIONS).await?;
                    return Ok(());
                };
                updated.options = options;
                if updated.answer >= updated.options.len() {
                    updated.answer = 0;
                }
            }
            EditField::Answer => {
                let Some(answer) = parse_answer(text, updated.options.len()) else {
                    self.reply(chat_id, messages::answer_out_of_range(updated.options.len()))
                        .await?;
                    return Ok(());
                };
                updated.answer = answer;
            }
        }

        self.sessions.clear_dialog(key);
        match self.questions.replace_at(index, question.id, updated).await {
            Ok(()) => {
                self.reply(chat_id, "✅ Question updated successfully!").await?;
            }
            Err(BotError::NotFoundError { what }) => {
                tracing::warn!("⚠️ Edit target changed: {}", what);
                self.reply(chat_id, QUESTION_GONE).await?;
            }
            Err(e) => {
                tracing::error!("❌ Failed to update question: {}", e);
                self.reply(chat_id, messages::SAVE_FAILED).await?;
            }
        }
        Ok(())
    }
}

fn edit_prompt(question: &Question, field: EditField) -> String {
    match field {
        EditField::Text => "Enter the new question text:".to_string(),
        EditField::Options => "Enter the new options, one per line:".to_string(),
        EditField::Answer => format!(
            "{}\n\nEnter the number of the correct answer (1-{}):",
            messages::numbered_options(&question.options),
            question.options.len()
        ),
        EditField::Category => "Enter the new category:".to_string(),
    }
}
