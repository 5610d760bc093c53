use super::QuizBot;
use crate::core::conversation::{parse_positive_id, PendingPoll};
use crate::core::keyboards::{self, POLL_DEFAULT_CATEGORY};
use crate::core::messages;
use crate::domain::model::Question;
use crate::domain::ports::{BotApi, Storage};
use crate::domain::telegram::{Message, User};
use crate::utils::error::Result;

/// `/poll2q` 的參數
#[derive(Debug, Default, PartialEq)]
struct Poll2qArgs {
    preset_id: Option<u64>,
    start_id: Option<u64>,
    batch: bool,
}

fn parse_poll2q_args(args: &[String]) -> Poll2qArgs {
    let mut parsed = Poll2qArgs::default();
    for arg in args {
        if let Some(value) = arg.strip_prefix("id=") {
            parsed.preset_id = parse_positive_id(value);
        } else if let Some(value) = arg.strip_prefix("start=") {
            parsed.start_id = parse_positive_id(value);
        } else if arg.eq_ignore_ascii_case("batch") {
            parsed.batch = true;
        }
    }
    parsed
}

impl<A: BotApi + 'static, S: Storage + 'static> QuizBot<A, S> {
    pub(super) async fn poll2q_command(
        &self,
        message: &Message,
        user: &User,
        args: &[String],
    ) -> Result<()> {
        let chat_id = message.chat.id;
        let key = (chat_id, user.id);

        let Some(poll) = message
            .reply_to_message
            .as_ref()
            .and_then(|reply| reply.poll.as_ref())
        else {
            self.reply(chat_id, messages::POLL2Q_USAGE).await?;
            return Ok(());
        };

        let options = poll.option_texts();
        if options.len() < 2 {
            self.reply(chat_id, "❌ The poll needs at least 2 options to become a question.")
                .await?;
            return Ok(());
        }

        let args = parse_poll2q_args(args);
        let mut batch = self.sessions.poll_batch(key);
        if let Some(start) = args.start_id {
            batch.next_id = Some(start);
        }
        if args.batch {
            batch.batch = true;
        }
        self.sessions.set_poll_batch(key, batch.clone());

        let answer = poll
            .correct_option_id
            .filter(|i| poll.is_quiz() && *i < options.len());
        let analysis = messages::poll_analysis(&poll.question, &options, answer);
        let mut pending = PendingPoll {
            question: poll.question.clone(),
            options,
            answer,
            category: None,
            preset_id: args.preset_id,
            category_choices: Vec::new(),
        };
        tracing::info!(
            "📥 Converting poll {} for user {} (answer known: {})",
            poll.id,
            user.id,
            answer.is_some()
        );

        let Some(answer) = answer else {
            let keyboard = keyboards::poll_answers(&pending.options);
            self.sessions.set_pending_poll(key, pending);
            self.reply_with_keyboard(chat_id, analysis, keyboard).await?;
            return Ok(());
        };

        self.reply(chat_id, analysis).await?;
        if pending.preset_id.is_some() || batch.next_id.is_some() {
            pending.category = Some(POLL_DEFAULT_CATEGORY.to_string());
            self.sessions.set_pending_poll(key, pending);
            return self.save_pending_poll(chat_id, key, None).await;
        }

        let prompt = messages::poll_category_prompt(&pending.question, &pending.options, answer);
        let questions = self.questions.load().await?;
        pending.category_choices = keyboards::ranked_poll_categories(&questions);
        let keyboard = keyboards::poll_categories(&pending.category_choices);
        self.sessions.set_pending_poll(key, pending);
        self.reply_with_keyboard(chat_id, prompt, keyboard).await?;
        Ok(())
    }

    pub(super) async fn poll_answer_selected(
        &self,
        chat_id: i64,
        message_id: i64,
        key: (i64, i64),
        index: usize,
    ) -> Result<()> {
        let questions = self.questions.load().await?;
        let choices = keyboards::ranked_poll_categories(&questions);
        let updated = self.sessions.update_pending_poll(key, |poll| {
            if index < poll.options.len() {
                poll.answer = Some(index);
                poll.category_choices = choices;
            }
        });
        let Some(poll) = updated.filter(|p| p.answer == Some(index)) else {
            self.edit(chat_id, message_id, messages::PENDING_POLL_MISSING, None)
                .await?;
            return Ok(());
        };

        self.edit(
            chat_id,
            message_id,
            messages::poll_category_prompt(&poll.question, &poll.options, index),
            Some(keyboards::poll_categories(&poll.category_choices)),
        )
        .await
    }

    pub(super) async fn poll_category_selected(
        &self,
        chat_id: i64,
        message_id: i64,
        key: (i64, i64),
        choice: usize,
    ) -> Result<()> {
        let updated = self.sessions.update_pending_poll(key, |poll| {
            poll.category = poll.category_choices.get(choice).cloned();
        });
        let Some((poll, category)) =
            updated.and_then(|poll| poll.category.clone().map(|category| (poll, category)))
        else {
            self.edit(chat_id, message_id, messages::PENDING_POLL_MISSING, None)
                .await?;
            return Ok(());
        };

        if poll.preset_id.is_some() || self.sessions.poll_batch(key).next_id.is_some() {
            self.edit(chat_id, message_id, format!("🏷️ Category: {}", category), None)
                .await?;
            return self.save_pending_poll(chat_id, key, None).await;
        }

        self.edit(
            chat_id,
            message_id,
            format!("🏷️ Category: {}\n\n🆔 How should this question get its ID?", category),
            Some(keyboards::poll_id_method()),
        )
        .await
    }

    /// 儲存待轉換的投票。id 優先順序：使用者選擇 > `id=X` > `start=Y` 計數器 > 自動
    pub(super) async fn save_pending_poll(
        &self,
        chat_id: i64,
        key: (i64, i64),
        chosen_id: Option<u64>,
    ) -> Result<()> {
        let Some(pending) = self.sessions.take_pending_poll(key) else {
            self.reply(chat_id, messages::PENDING_POLL_MISSING).await?;
            return Ok(());
        };

        let mut batch = self.sessions.poll_batch(key);
        let preset_id = pending.preset_id;
        let from_counter = chosen_id.is_none() && preset_id.is_none() && batch.next_id.is_some();
        let target_id = chosen_id.or(preset_id).or(batch.next_id);

        let Some(question) = pending.into_question(0, POLL_DEFAULT_CATEGORY) else {
            self.reply(chat_id, messages::PENDING_POLL_MISSING).await?;
            return Ok(());
        };

        let saved = match target_id {
            Some(id) => self.questions.add(Question { id, ..question }).await,
            None => self.questions.add_with_next_id(question).await,
        };
        let saved = match saved {
            Ok(saved) => saved,
            Err(e) => {
                tracing::error!("❌ Failed to save converted poll: {}", e);
                self.reply(chat_id, messages::SAVE_FAILED).await?;
                return Ok(());
            }
        };

        if from_counter {
            batch.next_id = Some(saved.id + 1);
            self.sessions.set_poll_batch(key, batch.clone());
        }

        let sharing = self.questions.get_set(saved.id).await?.len();
        self.reply(chat_id, messages::poll_saved(&saved, sharing, batch.batch))
            .await?;
        Ok(())
    }
}
