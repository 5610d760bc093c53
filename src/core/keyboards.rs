use crate::core::callbacks::CallbackAction;
use crate::core::messages::{option_marker, truncate};
use crate::domain::model::Question;
use crate::domain::telegram::{InlineKeyboardButton, InlineKeyboardMarkup};
use std::collections::{BTreeSet, HashMap};

/// 新增題目時提供的預設分類
pub const QUESTION_CATEGORIES: [&[&str]; 3] = [
    &["Geography", "Science", "History"],
    &["Literature", "Sports", "Entertainment"],
    &["General Knowledge", "Other"],
];

pub const POLL_DEFAULT_CATEGORY: &str = "Poll Quiz";
const DELETE_ROWS: usize = 50;
const BROWSE_IDS: usize = 15;
const POLL_CATEGORIES: usize = 6;

fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::new(text, action.to_string())
}

fn pairs(buttons: Vec<InlineKeyboardButton>) -> Vec<Vec<InlineKeyboardButton>> {
    buttons.chunks(2).map(|row| row.to_vec()).collect()
}

pub fn timer_keyboard(timers: &[u64]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![timers
        .iter()
        .map(|secs| button(format!("{} seconds", secs), CallbackAction::Timer(*secs)))
        .collect()])
}

/// 按鈕帶的是 `categories` 中的索引，按下時再對照目前的分類清單
pub fn quiz_categories(categories: &[String]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(pairs(
        categories
            .iter()
            .enumerate()
            .map(|(i, c)| button(c.clone(), CallbackAction::QuizCategory(i)))
            .collect(),
    ))
}

pub fn question_categories() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        QUESTION_CATEGORIES
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| button(*c, CallbackAction::QuestionCategory(c.to_string())))
                    .collect()
            })
            .collect(),
    )
}

pub fn delete_keyboard(questions: &[Question]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = questions
        .iter()
        .take(DELETE_ROWS)
        .enumerate()
        .map(|(i, q)| {
            vec![button(
                format!("{}. {}", i + 1, truncate(&q.question, 30)),
                CallbackAction::Delete(q.id),
            )]
        })
        .collect();
    rows.push(vec![button("Cancel", CallbackAction::DeleteCancel)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn clone_methods() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("From URL", CallbackAction::CloneUrl)],
        vec![button("Create Manually", CallbackAction::CloneManual)],
    ])
}

pub fn poll_answers(options: &[String]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                vec![button(
                    format!("{} {}", option_marker(i), truncate(option, 23)),
                    CallbackAction::PollAnswer(i),
                )]
            })
            .collect(),
    )
}

fn category_emoji(category: &str) -> &'static str {
    match category {
        "Quiz" => "🎮",
        "General Knowledge" => "🧠",
        "Trivia" => "❓",
        "Science" => "🔬",
        "Sports" => "⚽",
        "History" => "📜",
        "Geography" => "🌍",
        "Entertainment" => "🎬",
        "Music" => "🎵",
        "Art" => "🎨",
        "Technology" => "💻",
        "Food" => "🍔",
        "Animals" => "🐾",
        "Politics" => "🏛️",
        "Literature" => "📚",
        _ => "📋",
    }
}

/// 投票轉題目的分類：Quiz 永遠第一，其餘依使用次數排序，最多六個
pub fn ranked_poll_categories(questions: &[Question]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for q in questions.iter().filter(|q| !q.category.is_empty()) {
        *counts.entry(q.category.as_str()).or_default() += 1;
    }

    let mut categories: BTreeSet<String> = if counts.is_empty() {
        ["General Knowledge", "Trivia", "Science", "Sports", "History"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    } else {
        counts.keys().map(|c| c.to_string()).collect()
    };
    categories.insert("Quiz".to_string());

    let mut ranked: Vec<String> = categories.into_iter().collect();
    ranked.sort_by_key(|c| {
        (
            c != "Quiz",
            std::cmp::Reverse(counts.get(c.as_str()).copied().unwrap_or(0)),
        )
    });
    ranked.truncate(POLL_CATEGORIES);
    ranked
}

/// `choices` 通常來自 [`ranked_poll_categories`]，並存進待轉換的投票供按鈕索引對照
pub fn poll_categories(choices: &[String]) -> InlineKeyboardMarkup {
    let mut rows = pairs(
        choices
            .iter()
            .enumerate()
            .map(|(i, c)| button(format!("{} {}", category_emoji(c), c), CallbackAction::PollCategory(i)))
            .collect(),
    );
    rows.push(vec![button("⏭️ Skip to ID Selection", CallbackAction::PollIdCustom)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn poll_id_method() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("Auto-generate ID", CallbackAction::PollIdAuto)],
        vec![button("Use Custom ID", CallbackAction::PollIdCustom)],
    ])
}

pub fn poll_id_menu(questions: &[Question]) -> InlineKeyboardMarkup {
    let max_id = questions.iter().map(|q| q.id).max();
    let mut rows = vec![
        vec![button(
            "🔢 Next Available ID",
            CallbackAction::PollIdNext(max_id.map_or(1, |id| id + 1)),
        )],
        vec![button("🔄 Auto Generate ID", CallbackAction::PollIdAuto)],
        vec![button("✏️ Type Custom ID", CallbackAction::PollIdInput)],
    ];

    if let Some(recent) = max_id {
        let count = questions.iter().filter(|q| q.id == recent).count();
        rows.push(vec![button(
            format!("➕ Add to ID #{} ({} questions)", recent, count),
            CallbackAction::PollIdUse(recent),
        )]);

        let distinct: BTreeSet<u64> = questions.iter().map(|q| q.id).collect();
        if distinct.len() > 1 {
            rows.push(vec![button("🔍 Browse All IDs", CallbackAction::PollIdBrowse)]);
        }
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn poll_id_browse(questions: &[Question]) -> InlineKeyboardMarkup {
    let distinct: BTreeSet<u64> = questions.iter().map(|q| q.id).collect();
    let mut rows = pairs(
        distinct
            .into_iter()
            .take(BROWSE_IDS)
            .map(|id| {
                let count = questions.iter().filter(|q| q.id == id).count();
                button(format!("ID #{} ({})", id, count), CallbackAction::PollIdUse(id))
            })
            .collect(),
    );
    rows.push(vec![button("🔙 Back", CallbackAction::PollIdCustom)]);
    InlineKeyboardMarkup::new(rows)
}
