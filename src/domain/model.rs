use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_CATEGORY: &str = "General";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// 一道選擇題。`answer` 為 0 起算的正確選項索引。
/// 多道題目可以共用同一個 `id`，形成一個題組。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: u64,
    pub question: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub answer: usize,
    #[serde(default = "default_category")]
    pub category: String,
}

impl Question {
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.answer).map(String::as_str)
    }

    pub fn is_playable(&self) -> bool {
        self.options.len() >= 2 && self.answer < self.options.len()
    }
}

/// 題目草稿：新增、複製、投票轉換流程共用
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub answer: Option<usize>,
    pub category: Option<String>,
}

impl QuestionDraft {
    pub fn into_question(self, id: u64) -> Question {
        Question {
            id,
            question: self.question,
            options: self.options,
            answer: self.answer.unwrap_or(0),
            category: self.category.unwrap_or_else(default_category),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub quizzes_taken: u64,
    #[serde(default)]
    pub correct_answers: u64,
    #[serde(default)]
    pub total_answers: u64,
    #[serde(default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_active: Option<String>,
}

impl UserStats {
    pub fn accuracy(&self) -> f64 {
        if self.total_answers == 0 {
            0.0
        } else {
            self.correct_answers as f64 / self.total_answers as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub name: String,
    pub score: f64,
    pub correct_answers: u64,
    pub total_answers: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: i64,
    pub name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub option_id: Option<usize>,
    pub is_correct: bool,
    pub player: Player,
}

/// 已送出的投票；answers 以使用者 id 為鍵，保留作答先後順序
#[derive(Debug, Clone, PartialEq)]
pub struct PollRecord {
    pub question_index: usize,
    pub message_id: i64,
    pub answers: Vec<(i64, AnswerRecord)>,
}

/// 聊天室中進行中的測驗
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub chat_id: i64,
    pub creator: Option<Player>,
    pub questions: Vec<Question>,
    pub next_index: usize,
    pub timer_seconds: u64,
    pub polls: HashMap<String, PollRecord>,
    pub poll_order: Vec<String>,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub user_id: i64,
    pub name: String,
    pub username: Option<String>,
    pub correct: u32,
    pub answered: u32,
    pub wrong: u32,
}

impl Standing {
    pub fn negative_points(&self, negative_marking: f64) -> f64 {
        self.wrong as f64 * negative_marking
    }

    pub fn score(&self, negative_marking: f64) -> f64 {
        self.correct as f64 - self.negative_points(negative_marking)
    }
}
