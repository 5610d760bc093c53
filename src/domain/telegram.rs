//! Telegram Bot API 資料型別（僅涵蓋本專案使用到的子集）

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseParameters {
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_answer: Option<PollAnswer>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<Poll>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message: Option<Box<Message>>,
}

impl Message {
    /// 解析指令：回傳（不含 `/` 與 `@bot` 後綴的指令名稱, 參數）
    pub fn command(&self) -> Option<(String, Vec<String>)> {
        let text = self.text.as_deref()?.trim();
        let rest = text.strip_prefix('/')?;
        let mut parts = rest.split_whitespace();
        let head = parts.next()?;
        let name = head.split('@').next().unwrap_or(head).to_lowercase();
        if name.is_empty() {
            return None;
        }
        Some((name, parts.map(str::to_string).collect()))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PollOption {
    pub text: String,
    #[serde(default)]
    pub voter_count: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    #[serde(rename = "type", default = "default_poll_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<usize>,
    #[serde(default)]
    pub is_closed: bool,
}

fn default_poll_type() -> String {
    "regular".to_string()
}

impl Poll {
    pub fn is_quiz(&self) -> bool {
        self.kind == "quiz"
    }

    pub fn option_texts(&self) -> Vec<String> {
        self.options.iter().map(|o| o.text.clone()).collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollAnswer {
    pub poll_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default)]
    pub option_ids: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

impl InlineKeyboardMarkup {
    pub fn new(rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self {
            inline_keyboard: rows,
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineKeyboardButton> {
        self.inline_keyboard.iter().flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
    #[serde(rename = "HTML")]
    Html,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl SendMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            reply_markup: None,
        }
    }

    pub fn markdown(mut self) -> Self {
        self.parse_mode = Some(ParseMode::Markdown);
        self
    }

    pub fn keyboard(mut self, markup: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditMessageText {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl EditMessageText {
    pub fn text(chat_id: i64, message_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            text: text.into(),
            parse_mode: None,
            reply_markup: None,
        }
    }

    pub fn keyboard(mut self, markup: InlineKeyboardMarkup) -> Self {
        self.reply_markup = Some(markup);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendPoll {
    pub chat_id: i64,
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_anonymous: bool,
    pub correct_option_id: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_period: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetUpdates {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_poll_answer_update() {
        let raw = r#"{
            "update_id": 42,
            "poll_answer": {
                "poll_id": "5432",
                "user": {"id": 7, "is_bot": false, "first_name": "Ada", "username": "ada"},
                "option_ids": [2]
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let answer = update.poll_answer.unwrap();
        assert_eq!(answer.poll_id, "5432");
        assert_eq!(answer.option_ids, vec![2]);
        assert_eq!(answer.user.unwrap().username.as_deref(), Some("ada"));
    }

    #[test]
    fn test_command_parsing_strips_bot_suffix() {
        let raw = r#"{
            "message_id": 1,
            "chat": {"id": -100, "type": "supergroup"},
            "text": "/Quiz@QuizMasterBot 3 start=10"
        }"#;
        let message: Message = serde_json::from_str(raw).unwrap();
        let (name, args) = message.command().unwrap();
        assert_eq!(name, "quiz");
        assert_eq!(args, vec!["3".to_string(), "start=10".to_string()]);
    }

    #[test]
    fn test_send_poll_serialization_omits_empty_fields() {
        let poll = SendPoll {
            chat_id: 1,
            question: "Q?".to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            kind: "quiz".to_string(),
            is_anonymous: false,
            correct_option_id: 1,
            explanation: None,
            open_period: Some(15),
        };
        let json = serde_json::to_value(&poll).unwrap();
        assert_eq!(json["type"], "quiz");
        assert_eq!(json["open_period"], 15);
        assert!(json.get("explanation").is_none());
    }
}
