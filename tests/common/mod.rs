#![allow(dead_code)]

use async_trait::async_trait;
use quiz_bot::config::AppConfig;
use quiz_bot::domain::ports::{BotApi, Storage};
use quiz_bot::domain::telegram::{
    CallbackQuery, Chat, EditMessageText, Message, Poll, PollAnswer, PollOption, SendMessage,
    SendPoll, Update, User,
};
use quiz_bot::utils::error::{BotError, Result};
use quiz_bot::{QuizBot, Stores};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 記憶體中的儲存體，不存在的檔案回傳 NotFound
#[derive(Default)]
pub struct MemoryStorage {
    files: tokio::sync::Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, path: &str, data: &[u8]) {
        self.files
            .lock()
            .await
            .insert(path.to_string(), data.to_vec());
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.files.lock().await.contains_key(path)
    }

    pub async fn json(&self, path: &str) -> serde_json::Value {
        let files = self.files.lock().await;
        serde_json::from_slice(files.get(path).expect("file exists")).unwrap()
    }
}

impl Storage for MemoryStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let files = self.files.lock().await;
        files.get(path).cloned().ok_or_else(|| {
            BotError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ))
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.put(path, data).await;
        Ok(())
    }
}

/// 記錄所有送出請求的 Bot API
#[derive(Default)]
pub struct MockBotApi {
    pub sent: Mutex<Vec<SendMessage>>,
    pub edits: Mutex<Vec<EditMessageText>>,
    pub polls: Mutex<Vec<SendPoll>>,
    pub poll_ids: Mutex<Vec<String>>,
    pub answered_callbacks: Mutex<Vec<String>>,
    pub fail_polls: AtomicBool,
    /// getUpdates 依序回傳的結果；用完後模擬一次沒有更新的長輪詢
    pub scripted_updates: Mutex<VecDeque<Result<Vec<Update>>>>,
    /// 每次 getUpdates 的 offset 與呼叫時間
    pub update_calls: Mutex<Vec<(i64, tokio::time::Instant)>>,
    next_id: AtomicI64,
}

impl MockBotApi {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|m| m.text.clone()).collect()
    }

    pub fn last_text(&self) -> String {
        self.texts().last().cloned().unwrap_or_default()
    }

    pub fn last_sent(&self) -> SendMessage {
        self.sent.lock().unwrap().last().cloned().expect("a message was sent")
    }

    pub fn last_edit(&self) -> EditMessageText {
        self.edits.lock().unwrap().last().cloned().expect("a message was edited")
    }

    pub fn sent_polls(&self) -> Vec<SendPoll> {
        self.polls.lock().unwrap().clone()
    }

    pub fn poll_id(&self, index: usize) -> String {
        self.poll_ids.lock().unwrap()[index].clone()
    }

    pub fn script_updates(&self, result: Result<Vec<Update>>) {
        self.scripted_updates.lock().unwrap().push_back(result);
    }

    pub fn update_offsets(&self) -> Vec<i64> {
        self.update_calls.lock().unwrap().iter().map(|(offset, _)| *offset).collect()
    }

    pub fn update_call_times(&self) -> Vec<tokio::time::Instant> {
        self.update_calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

fn chat(id: i64) -> Chat {
    Chat {
        id,
        kind: "group".to_string(),
        title: None,
    }
}

#[async_trait]
impl BotApi for MockBotApi {
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.update_calls
            .lock()
            .unwrap()
            .push((offset, tokio::time::Instant::now()));
        let scripted = self.scripted_updates.lock().unwrap().pop_front();
        match scripted {
            Some(result) => result,
            None => {
                tokio::time::sleep(Duration::from_secs(timeout_secs.max(1))).await;
                Ok(Vec::new())
            }
        }
    }

    async fn send_message(&self, request: SendMessage) -> Result<Message> {
        let message = Message {
            message_id: self.next_id(),
            from: None,
            chat: chat(request.chat_id),
            date: 0,
            text: Some(request.text.clone()),
            poll: None,
            reply_to_message: None,
        };
        self.sent.lock().unwrap().push(request);
        Ok(message)
    }

    async fn edit_message_text(&self, request: EditMessageText) -> Result<()> {
        self.edits.lock().unwrap().push(request);
        Ok(())
    }

    async fn send_poll(&self, request: SendPoll) -> Result<Message> {
        if self.fail_polls.load(Ordering::SeqCst) {
            return Err(BotError::TelegramApiError {
                code: 400,
                description: "Bad Request: poll can't be sent".to_string(),
                retry_after: None,
            });
        }
        let id = self.next_id();
        let poll = Poll {
            id: format!("poll-{}", id),
            question: request.question.clone(),
            options: request
                .options
                .iter()
                .map(|text| PollOption {
                    text: text.clone(),
                    voter_count: 0,
                })
                .collect(),
            kind: request.kind.clone(),
            correct_option_id: Some(request.correct_option_id),
            is_closed: false,
        };
        let message = Message {
            message_id: id,
            from: None,
            chat: chat(request.chat_id),
            date: 0,
            text: None,
            poll: Some(poll),
            reply_to_message: None,
        };
        self.polls.lock().unwrap().push(request);
        self.poll_ids.lock().unwrap().push(format!("poll-{}", id));
        Ok(message)
    }

    async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        self.answered_callbacks
            .lock()
            .unwrap()
            .push(callback_query_id.to_string());
        Ok(())
    }
}

pub type TestBot = QuizBot<MockBotApi, MemoryStorage>;

pub fn test_bot() -> (TestBot, Arc<MockBotApi>, Arc<MemoryStorage>) {
    let api = Arc::new(MockBotApi::default());
    let storage = Arc::new(MemoryStorage::new());
    let bot = QuizBot::new(api.clone(), Stores::new(storage.clone()), &AppConfig::new())
        .expect("bot builds");
    (bot, api, storage)
}

pub fn user(id: i64, first_name: &str) -> User {
    User {
        id,
        is_bot: false,
        first_name: first_name.to_string(),
        last_name: None,
        username: None,
    }
}

pub fn message(chat_id: i64, from: &User, text: &str) -> Message {
    Message {
        message_id: 1,
        from: Some(from.clone()),
        chat: chat(chat_id),
        date: 0,
        text: Some(text.to_string()),
        poll: None,
        reply_to_message: None,
    }
}

pub fn text_update(chat_id: i64, from: &User, text: &str) -> Update {
    Update {
        update_id: 1,
        message: Some(message(chat_id, from, text)),
        ..Update::default()
    }
}

pub fn reply_update(chat_id: i64, from: &User, text: &str, replied: Message) -> Update {
    let mut message = message(chat_id, from, text);
    message.reply_to_message = Some(Box::new(replied));
    Update {
        update_id: 1,
        message: Some(message),
        ..Update::default()
    }
}

pub fn poll_message(chat_id: i64, question: &str, options: &[&str], correct: Option<usize>) -> Message {
    let poll = Poll {
        id: "source-poll".to_string(),
        question: question.to_string(),
        options: options
            .iter()
            .map(|text| PollOption {
                text: text.to_string(),
                voter_count: 0,
            })
            .collect(),
        kind: if correct.is_some() { "quiz" } else { "regular" }.to_string(),
        correct_option_id: correct,
        is_closed: true,
    };
    Message {
        message_id: 99,
        from: None,
        chat: chat(chat_id),
        date: 0,
        text: None,
        poll: Some(poll),
        reply_to_message: None,
    }
}

pub fn callback_update(chat_id: i64, from: &User, message_id: i64, data: &str) -> Update {
    let mut message = message(chat_id, from, "menu");
    message.message_id = message_id;
    Update {
        update_id: 1,
        callback_query: Some(CallbackQuery {
            id: format!("cb-{}", data),
            from: from.clone(),
            message: Some(message),
            data: Some(data.to_string()),
        }),
        ..Update::default()
    }
}

pub fn poll_answer_update(poll_id: &str, from: &User, option_ids: Vec<usize>) -> Update {
    Update {
        update_id: 1,
        poll_answer: Some(PollAnswer {
            poll_id: poll_id.to_string(),
            user: Some(from.clone()),
            option_ids,
        }),
        ..Update::default()
    }
}
