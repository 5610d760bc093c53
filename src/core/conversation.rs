use crate::core::quiz::QuizRequest;
use crate::domain::model::{Question, QuestionDraft};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// 新增題目或手動複製：流程相同，只有訊息用字不同
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftMode {
    Add,
    Clone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Text,
    Options,
    Answer,
    Category,
}

impl EditField {
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim() {
            "1" => Some(EditField::Text),
            "2" => Some(EditField::Options),
            "3" => Some(EditField::Answer),
            "4" => Some(EditField::Category),
            _ => None,
        }
    }
}

/// 使用者在某個聊天室中進行中的多步驟對話
#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    QuestionText { mode: DraftMode },
    Options { mode: DraftMode, draft: QuestionDraft },
    Answer { mode: DraftMode, draft: QuestionDraft },
    Category { mode: DraftMode, draft: QuestionDraft },
    CloneUrl,
    EditSelect { ids: Vec<u64> },
    EditChooseField { index: usize, question: Question },
    EditValue { index: usize, question: Question, field: EditField },
    PollCustomId,
}

/// `/poll2q` 轉換中的投票資料
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPoll {
    pub question: String,
    pub options: Vec<String>,
    pub answer: Option<usize>,
    pub category: Option<String>,
    /// `/poll2q id=X` 指定的題組 id
    pub preset_id: Option<u64>,
    /// 分類鍵盤上顯示的分類，依按鈕索引對照
    pub category_choices: Vec<String>,
}

impl PendingPoll {
    pub fn into_question(self, id: u64, default_category: &str) -> Option<Question> {
        let answer = self.answer?;
        Some(Question {
            id,
            question: self.question,
            options: self.options,
            answer,
            category: self.category.unwrap_or_else(|| default_category.to_string()),
        })
    }
}

/// `/poll2q start=Y batch` 在多次轉換之間保留的設定
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollBatch {
    pub next_id: Option<u64>,
    pub batch: bool,
}

#[derive(Debug, Default)]
struct UserState {
    dialog: Option<Dialog>,
    pending_quiz: Option<QuizRequest>,
    pending_poll: Option<PendingPoll>,
    poll_batch: PollBatch,
}

impl UserState {
    fn is_idle(&self) -> bool {
        self.dialog.is_none()
            && self.pending_quiz.is_none()
            && self.pending_poll.is_none()
            && self.poll_batch == PollBatch::default()
    }
}

/// 以 (chat_id, user_id) 為鍵的對話狀態；沒有任何狀態的使用者不佔項目
#[derive(Debug, Default)]
pub struct SessionStore {
    users: Mutex<HashMap<(i64, i64), UserState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(i64, i64), UserState>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read<R>(&self, key: (i64, i64), f: impl FnOnce(&UserState) -> R) -> Option<R> {
        self.lock().get(&key).map(f)
    }

    fn update<R>(&self, key: (i64, i64), f: impl FnOnce(&mut UserState) -> R) -> R {
        let mut users = self.lock();
        let state = users.entry(key).or_default();
        let result = f(state);
        if state.is_idle() {
            users.remove(&key);
        }
        result
    }

    /// 目前保有狀態的使用者數
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dialog(&self, key: (i64, i64)) -> Option<Dialog> {
        self.read(key, |s| s.dialog.clone()).flatten()
    }

    pub fn set_dialog(&self, key: (i64, i64), dialog: Dialog) {
        self.update(key, |s| s.dialog = Some(dialog));
    }

    /// 結束對話，回傳原本是否有對話
    pub fn clear_dialog(&self, key: (i64, i64)) -> bool {
        self.update(key, |s| s.dialog.take().is_some())
    }

    pub fn set_pending_quiz(&self, key: (i64, i64), request: QuizRequest) {
        self.update(key, |s| s.pending_quiz = Some(request));
    }

    pub fn take_pending_quiz(&self, key: (i64, i64)) -> Option<QuizRequest> {
        self.update(key, |s| s.pending_quiz.take())
    }

    pub fn set_pending_poll(&self, key: (i64, i64), poll: PendingPoll) {
        self.update(key, |s| s.pending_poll = Some(poll));
    }

    pub fn pending_poll(&self, key: (i64, i64)) -> Option<PendingPoll> {
        self.read(key, |s| s.pending_poll.clone()).flatten()
    }

    pub fn update_pending_poll(&self, key: (i64, i64), f: impl FnOnce(&mut PendingPoll)) -> Option<PendingPoll> {
        self.update(key, |s| {
            let poll = s.pending_poll.as_mut()?;
            f(poll);
            Some(poll.clone())
        })
    }

    pub fn take_pending_poll(&self, key: (i64, i64)) -> Option<PendingPoll> {
        self.update(key, |s| s.pending_poll.take())
    }

    pub fn poll_batch(&self, key: (i64, i64)) -> PollBatch {
        self.read(key, |s| s.poll_batch.clone()).unwrap_or_default()
    }

    pub fn set_poll_batch(&self, key: (i64, i64), batch: PollBatch) {
        self.update(key, |s| s.poll_batch = batch);
    }

    /// `/cancel`：清除對話與所有待處理資料
    pub fn reset(&self, key: (i64, i64)) -> bool {
        self.lock()
            .remove(&key)
            .is_some_and(|s| s.dialog.is_some() || s.pending_poll.is_some())
    }
}

/// 每行一個選項，忽略空白行；至少需要兩個
pub fn parse_options(text: &str) -> Option<Vec<String>> {
    let options: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    (options.len() >= 2).then_some(options)
}

/// 1 起算的答案編號轉成 0 起算索引
pub fn parse_answer(text: &str, option_count: usize) -> Option<usize> {
    let number: usize = text.trim().parse().ok()?;
    (1..=option_count).contains(&number).then(|| number - 1)
}

pub fn parse_positive_id(text: &str) -> Option<u64> {
    text.trim().parse::<u64>().ok().filter(|id| *id > 0)
}
