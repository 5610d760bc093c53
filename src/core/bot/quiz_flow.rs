use super::{player_from, QuizBot};
use crate::core::messages;
use crate::core::quiz::{select_questions, QuizRequest};
use crate::domain::model::{Player, QuizSession};
use crate::domain::ports::{BotApi, Storage};
use crate::domain::telegram::{PollAnswer, SendPoll};
use crate::utils::error::Result;
use std::time::Duration;

impl<A: BotApi + 'static, S: Storage + 'static> QuizBot<A, S> {
    /// 選題並啟動測驗；投票由背景任務依序送出
    pub(super) async fn start_quiz(
        &self,
        chat_id: i64,
        creator: Player,
        request: QuizRequest,
        timer_seconds: u64,
    ) -> Result<()> {
        let all = self.questions.load().await?;
        let selection = {
            let mut rng = rand::thread_rng();
            select_questions(&request, &all, timer_seconds, &mut rng)
        };
        if selection.questions.is_empty() {
            self.reply(chat_id, messages::NO_QUESTIONS).await?;
            return Ok(());
        }

        let total = selection.questions.len();
        let session = QuizSession::new(chat_id, Some(creator), selection.questions, timer_seconds);
        let started = self.registry().start(session);
        if !started {
            self.reply(chat_id, messages::QUIZ_ALREADY_RUNNING).await?;
            return Ok(());
        }

        tracing::info!(
            "🎮 Quiz started in chat {} ({} questions, {}s timer)",
            chat_id,
            total,
            timer_seconds
        );
        if let Err(e) = self.reply(chat_id, selection.notice).await {
            tracing::warn!("⚠️ Failed to announce quiz in chat {}: {}", chat_id, e);
        }

        let bot = self.clone();
        tokio::spawn(async move {
            bot.run_quiz(chat_id).await;
        });
        Ok(())
    }

    /// 逐題送出投票，每題等待 timer + grace 秒
    pub async fn run_quiz(&self, chat_id: i64) {
        let grace = self.settings.grace_seconds;

        loop {
            let next = self.registry().next_question(chat_id);
            let Some((index, total, question, timer)) = next else {
                break;
            };

            let request = SendPoll {
                chat_id,
                question: question.question.clone(),
                options: question.options.clone(),
                kind: "quiz".to_string(),
                is_anonymous: false,
                correct_option_id: question.answer,
                explanation: Some(format!("Question {} of {}", index + 1, total)),
                open_period: Some(timer),
            };

            match self.api.send_poll(request).await {
                Ok(message) => {
                    let Some(poll) = message.poll else {
                        tracing::error!("❌ sendPoll returned no poll for chat {}", chat_id);
                        break;
                    };
                    tracing::debug!("📊 Sent question {}/{} as poll {}", index + 1, total, poll.id);
                    self.registry()
                        .register_poll(chat_id, poll.id, index, message.message_id);
                }
                Err(e) => {
                    tracing::error!(
                        "❌ Failed to send question {}/{} to chat {}: {}",
                        index + 1,
                        total,
                        chat_id,
                        e
                    );
                    break;
                }
            }

            tokio::time::sleep(Duration::from_secs(timer.saturating_add(grace))).await;
        }

        if let Err(e) = self.finish_quiz(chat_id).await {
            tracing::error!("❌ Failed to finish quiz in chat {}: {}", chat_id, e);
        }
    }

    async fn finish_quiz(&self, chat_id: i64) -> Result<()> {
        let finished = self.registry().finish(chat_id);
        let Some(session) = finished else {
            return Ok(());
        };

        let negative_marking = self.settings.negative_marking;
        let standings = session.standings(negative_marking);
        tracing::info!(
            "🏁 Quiz finished in chat {} ({} polls, {} participants)",
            chat_id,
            session.asked(),
            standings.len()
        );

        for standing in &standings {
            if let Err(e) = self
                .users
                .record_quiz_taken(standing.user_id, &standing.name)
                .await
            {
                tracing::error!("❌ Failed to update stats for {}: {}", standing.user_id, e);
            }
        }

        self.reply_chunked(chat_id, &session.render_results(negative_marking))
            .await
    }

    pub(super) async fn handle_poll_answer(&self, answer: PollAnswer) -> Result<()> {
        let Some(user) = answer.user.as_ref() else {
            return Ok(());
        };
        let player = player_from(user);

        let outcome = self
            .registry()
            .record_answer(&answer.poll_id, player.clone(), &answer.option_ids);
        let Some(outcome) = outcome else {
            tracing::debug!("Ignoring answer from {} on poll {}", player.id, answer.poll_id);
            return Ok(());
        };

        tracing::debug!(
            "✏️ {} answered poll {} in chat {} ({})",
            player.name,
            answer.poll_id,
            outcome.chat_id,
            if outcome.is_correct { "correct" } else { "wrong" }
        );
        self.users
            .record_answer(&player, outcome.is_correct, self.settings.negative_marking)
            .await?;
        Ok(())
    }
}
