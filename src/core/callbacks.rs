use crate::utils::error::BotError;
use std::fmt;
use std::str::FromStr;

/// Telegram 限制 callback_data 最多 64 bytes
pub const MAX_CALLBACK_DATA: usize = 64;

/// inline keyboard 按鈕的 callback_data。使用者輸入的分類以索引表示
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Timer(u64),
    QuizCategory(usize),
    QuestionCategory(String),
    Delete(u64),
    DeleteCancel,
    CloneUrl,
    CloneManual,
    PollAnswer(usize),
    PollCategory(usize),
    PollIdAuto,
    PollIdCustom,
    PollIdNext(u64),
    PollIdInput,
    PollIdBrowse,
    PollIdUse(u64),
}

fn number<T: FromStr>(data: &str, value: &str) -> Result<T, BotError> {
    value
        .parse()
        .map_err(|_| BotError::validation(format!("Malformed callback data: {}", data)))
}

impl FromStr for CallbackAction {
    type Err = BotError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let action = match data {
            "delete_cancel" => CallbackAction::DeleteCancel,
            "clone_url" => CallbackAction::CloneUrl,
            "clone_manual" => CallbackAction::CloneManual,
            "pollid_auto" => CallbackAction::PollIdAuto,
            "pollid_custom" => CallbackAction::PollIdCustom,
            "pollid_input" => CallbackAction::PollIdInput,
            "pollid_browse" => CallbackAction::PollIdBrowse,
            _ => {
                if let Some(v) = data.strip_prefix("timer_") {
                    CallbackAction::Timer(number(data, v)?)
                } else if let Some(v) = data.strip_prefix("category_") {
                    CallbackAction::QuestionCategory(v.to_string())
                } else if let Some(v) = data.strip_prefix("cat_") {
                    CallbackAction::QuizCategory(number(data, v)?)
                } else if let Some(v) = data.strip_prefix("delete_") {
                    CallbackAction::Delete(number(data, v)?)
                } else if let Some(v) = data.strip_prefix("pollans_") {
                    CallbackAction::PollAnswer(number(data, v)?)
                } else if let Some(v) = data.strip_prefix("pollcat_") {
                    CallbackAction::PollCategory(number(data, v)?)
                } else if let Some(v) = data.strip_prefix("pollid_next_") {
                    CallbackAction::PollIdNext(number(data, v)?)
                } else if let Some(v) = data.strip_prefix("pollid_use_") {
                    CallbackAction::PollIdUse(number(data, v)?)
                } else {
                    return Err(BotError::validation(format!(
                        "Unknown callback data: {}",
                        data
                    )));
                }
            }
        };
        Ok(action)
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::Timer(secs) => write!(f, "timer_{}", secs),
            CallbackAction::QuizCategory(i) => write!(f, "cat_{}", i),
            CallbackAction::QuestionCategory(c) => write!(f, "category_{}", c),
            CallbackAction::Delete(id) => write!(f, "delete_{}", id),
            CallbackAction::DeleteCancel => f.write_str("delete_cancel"),
            CallbackAction::CloneUrl => f.write_str("clone_url"),
            CallbackAction::CloneManual => f.write_str("clone_manual"),
            CallbackAction::PollAnswer(i) => write!(f, "pollans_{}", i),
            CallbackAction::PollCategory(i) => write!(f, "pollcat_{}", i),
            CallbackAction::PollIdAuto => f.write_str("pollid_auto"),
            CallbackAction::PollIdCustom => f.write_str("pollid_custom"),
            CallbackAction::PollIdNext(id) => write!(f, "pollid_next_{}", id),
            CallbackAction::PollIdInput => f.write_str("pollid_input"),
            CallbackAction::PollIdBrowse => f.write_str("pollid_browse"),
            CallbackAction::PollIdUse(id) => write!(f, "pollid_use_{}", id),
        }
    }
}
