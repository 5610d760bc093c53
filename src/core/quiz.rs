use crate::config::QuizSettings;
use crate::domain::model::{AnswerRecord, Player, PollRecord, Question, QuizSession, Standing};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// `/quiz` 或 `/category` 產生的待開始測驗
#[derive(Debug, Clone, PartialEq)]
pub struct QuizRequest {
    pub count: usize,
    pub specific_id: Option<u64>,
    pub start_id: Option<u64>,
    pub category: Option<String>,
}

impl QuizRequest {
    /// 解析 `/quiz [N] [id=X] [start=Y]`，無效的參數會產生警告並被忽略
    pub fn parse(args: &[String], settings: &QuizSettings) -> (Self, Vec<String>) {
        let mut request = Self {
            count: settings.default_question_count,
            specific_id: None,
            start_id: None,
            category: None,
        };
        let mut warnings = Vec::new();

        for arg in args {
            if let Some(value) = arg.strip_prefix("id=") {
                match value.parse::<u64>() {
                    Ok(id) => request.specific_id = Some(id),
                    Err(_) => warnings
                        .push("Invalid ID format. Using random questions instead.".to_string()),
                }
            } else if let Some(value) = arg.strip_prefix("start=") {
                match value.parse::<u64>() {
                    Ok(id) => request.start_id = Some(id),
                    Err(_) => warnings.push(
                        "Invalid start ID format. Using random questions instead.".to_string(),
                    ),
                }
            } else if let Ok(count) = arg.parse::<usize>() {
                request.count = count.clamp(1, settings.max_question_count);
            }
        }

        (request, warnings)
    }

    pub fn for_category(category: impl Into<String>, settings: &QuizSettings) -> Self {
        Self {
            count: settings.default_question_count,
            specific_id: None,
            start_id: None,
            category: Some(category.into()),
        }
    }

    pub fn summary(&self) -> String {
        if let Some(category) = &self.category {
            format!("📊 Selected up to {} questions from '{}'", self.count, category)
        } else if let Some(id) = self.specific_id {
            format!("📊 Starting quiz with question ID #{}", id)
        } else if let Some(id) = self.start_id {
            format!("📊 Starting quiz from question ID #{}", id)
        } else {
            format!("📊 Starting quiz with {} random questions", self.count)
        }
    }
}

/// 選題結果：題目與要顯示給使用者的說明
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub questions: Vec<Question>,
    pub notice: String,
}

fn random_sample<R: Rng + ?Sized>(pool: &[Question], count: usize, rng: &mut R) -> Vec<Question> {
    pool.choose_multiple(rng, count.min(pool.len()))
        .cloned()
        .collect()
}

pub fn select_questions<R: Rng + ?Sized>(
    request: &QuizRequest,
    all: &[Question],
    timer_seconds: u64,
    rng: &mut R,
) -> Selection {
    let timer_line = format!("⏱️ Timer: {} seconds", timer_seconds);
    let playable: Vec<Question> = all.iter().filter(|q| q.is_playable()).cloned().collect();

    if let Some(category) = &request.category {
        let pool: Vec<Question> = playable
            .iter()
            .filter(|q| &q.category == category)
            .cloned()
            .collect();
        let questions = random_sample(&pool, request.count, rng);
        let notice = format!(
            "📊 Starting quiz with {} questions from '{}'\n{}\n🏁 Get ready to play!",
            questions.len(),
            category,
            timer_line
        );
        return Selection { questions, notice };
    }

    if let Some(id) = request.specific_id {
        let set: Vec<Question> = playable.iter().filter(|q| q.id == id).cloned().collect();
        if !set.is_empty() {
            let notice = format!(
                "🎯 Starting quiz with question set #{} ({} question{})\n{}",
                id,
                set.len(),
                if set.len() == 1 { "" } else { "s" },
                timer_line
            );
            return Selection {
                questions: set,
                notice,
            };
        }
        return Selection {
            questions: random_sample(&playable, request.count, rng),
            notice: format!(
                "❌ Question with ID #{} not found. Using random questions instead.\n{}",
                id, timer_line
            ),
        };
    }

    if let Some(start) = request.start_id {
        let mut sorted = playable.clone();
        sorted.sort_by_key(|q| q.id);
        let questions: Vec<Question> = sorted
            .into_iter()
            .skip_while(|q| q.id < start)
            .take(request.count)
            .collect();

        if let (Some(first), Some(last)) = (questions.first(), questions.last()) {
            let notice = format!(
                "🔢 Starting quiz with IDs #{} to #{}\n📚 Total questions: {}\n{}",
                first.id,
                last.id,
                questions.len(),
                timer_line
            );
            return Selection { questions, notice };
        }
        return Selection {
            questions: random_sample(&playable, request.count, rng),
            notice: format!(
                "❌ No questions found with ID #{} or higher. Using random questions instead.\n{}",
                start, timer_line
            ),
        };
    }

    let questions = random_sample(&playable, request.count, rng);
    let notice = format!(
        "🎲 Starting a quiz with {} random questions.\n{}\n🏁 Get ready to play!",
        questions.len(),
        timer_line
    );
    Selection { questions, notice }
}

/// 投票作答的處理結果
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub chat_id: i64,
    pub is_correct: bool,
}

impl QuizSession {
    pub fn new(chat_id: i64, creator: Option<Player>, questions: Vec<Question>, timer_seconds: u64) -> Self {
        Self {
            chat_id,
            creator,
            questions,
            next_index: 0,
            timer_seconds,
            polls: HashMap::new(),
            poll_order: Vec::new(),
            active: true,
        }
    }

    pub fn asked(&self) -> usize {
        self.poll_order.len()
    }

    /// 每位使用者在每個投票只記錄第一次作答
    pub fn record_answer(&mut self, poll_id: &str, player: Player, option_ids: &[usize]) -> Option<bool> {
        let poll = self.polls.get_mut(poll_id)?;
        let question = self.questions.get(poll.question_index)?;
        if poll.answers.iter().any(|(id, _)| *id == player.id) {
            tracing::debug!("Ignoring repeated answer from {} on poll {}", player.id, poll_id);
            return None;
        }
        let option_id = option_ids.first().copied();
        let is_correct = option_id == Some(question.answer);
        poll.answers.push((
            player.id,
            AnswerRecord {
                option_id,
                is_correct,
                player,
            },
        ));
        Some(is_correct)
    }

    /// 由投票作答重建排名：分數高者優先，其次作答數少者，最後依首次出現順序
    pub fn standings(&self, negative_marking: f64) -> Vec<Standing> {
        let mut standings: Vec<Standing> = Vec::new();

        for poll_id in &self.poll_order {
            let Some(poll) = self.polls.get(poll_id) else {
                continue;
            };
            for (user_id, record) in &poll.answers {
                let index = match standings.iter().position(|s| s.user_id == *user_id) {
                    Some(index) => index,
                    None => {
                        standings.push(Standing {
                            user_id: *user_id,
                            name: record.player.name.clone(),
                            username: record.player.username.clone(),
                            correct: 0,
                            answered: 0,
                            wrong: 0,
                        });
                        standings.len() - 1
                    }
                };
                let standing = &mut standings[index];
                standing.answered += 1;
                if record.is_correct {
                    standing.correct += 1;
                } else {
                    standing.wrong += 1;
                }
            }
        }

        // sort_by 為穩定排序，同分時保留首次出現順序
        standings.sort_by(|a, b| {
            b.score(negative_marking)
                .total_cmp(&a.score(negative_marking))
                .then(a.answered.cmp(&b.answered))
        });
        standings
    }

    pub fn render_results(&self, negative_marking: f64) -> String {
        let total = self.asked();
        let standings = self.standings(negative_marking);
        let mut text = format!("🏁 The quiz has finished!\n\n{} questions answered\n\n", total);

        let Some(winner) = standings.first() else {
            text.push_str("😶 Nobody answered any question this time.\nStart another round with /quiz!");
            return text;
        };

        text.push_str(&format!("🏆 Congratulations to the winner: {}!\n\n", winner.name));
        text.push_str("📊 Final Rankings:\n\n");

        for (i, standing) in standings.iter().enumerate() {
            let rank = match i {
                0 => "🥇".to_string(),
                1 => "🥈".to_string(),
                2 => "🥉".to_string(),
                _ => format!("{}.", i + 1),
            };
            let username = standing
                .username
                .as_ref()
                .map(|u| format!(" (@{})", u))
                .unwrap_or_default();
            let negative = standing.negative_points(negative_marking);
            let adjusted = standing.score(negative_marking);
            let percentage = if total > 0 {
                adjusted / total as f64 * 100.0
            } else {
                0.0
            };

            let score = if negative > 0.0 {
                format!("{}-{:.2}={:.2}", standing.correct, negative, adjusted)
            } else {
                standing.correct.to_string()
            };
            text.push_str(&format!(
                "{} {}{}: {}/{} ({:.1}%)\n",
                rank, standing.name, username, score, total, percentage
            ));
        }

        text
    }
}

/// 所有聊天室的進行中測驗；poll_id 直接對應到聊天室
#[derive(Debug, Default)]
pub struct QuizRegistry {
    sessions: HashMap<i64, QuizSession>,
    poll_index: HashMap<String, i64>,
}

impl QuizRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, chat_id: i64) -> bool {
        self.sessions.get(&chat_id).is_some_and(|s| s.active)
    }

    pub fn active_count(&self) -> usize {
        self.sessions.values().filter(|s| s.active).count()
    }

    /// 每個聊天室同時只能有一個測驗
    pub fn start(&mut self, session: QuizSession) -> bool {
        if self.is_active(session.chat_id) {
            return false;
        }
        self.sessions.insert(session.chat_id, session);
        true
    }

    /// 取得下一題：回傳（索引, 總題數, 題目, 計時）
    pub fn next_question(&mut self, chat_id: i64) -> Option<(usize, usize, Question, u64)> {
        let session = self.sessions.get_mut(&chat_id).filter(|s| s.active)?;
        let question = session.questions.get(session.next_index)?.clone();
        let index = session.next_index;
        session.next_index += 1;
        Some((index, session.questions.len(), question, session.timer_seconds))
    }

    pub fn register_poll(&mut self, chat_id: i64, poll_id: String, question_index: usize, message_id: i64) -> bool {
        let Some(session) = self.sessions.get_mut(&chat_id) else {
            return false;
        };
        session.polls.insert(
            poll_id.clone(),
            PollRecord {
                question_index,
                message_id,
                answers: Vec::new(),
            },
        );
        session.poll_order.push(poll_id.clone());
        self.poll_index.insert(poll_id, chat_id);
        true
    }

    pub fn record_answer(&mut self, poll_id: &str, player: Player, option_ids: &[usize]) -> Option<AnswerOutcome> {
        let chat_id = *self.poll_index.get(poll_id)?;
        let session = self.sessions.get_mut(&chat_id)?;
        let is_correct = session.record_answer(poll_id, player, option_ids)?;
        Some(AnswerOutcome { chat_id, is_correct })
    }

    /// 結束測驗並移除，回傳最終狀態以產生成績
    pub fn finish(&mut self, chat_id: i64) -> Option<QuizSession> {
        let mut session = self.sessions.remove(&chat_id)?;
        session.active = false;
        for poll_id in &session.poll_order {
            self.poll_index.remove(poll_id);
        }
        Some(session)
    }
}
