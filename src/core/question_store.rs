use crate::domain::model::{Question, DEFAULT_CATEGORY};
use crate::domain::ports::Storage;
use crate::utils::error::{BotError, Result};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const QUESTIONS_FILE: &str = "questions.json";

/// 題庫：questions.json 的讀寫。所有修改都在同一把鎖內完成 load -> modify -> save
pub struct QuestionStore<S: Storage> {
    storage: Arc<S>,
    lock: Mutex<()>,
}

pub fn sample_questions() -> Vec<Question> {
    vec![
        Question {
            id: 1,
            question: "What is the capital of France?".to_string(),
            options: vec![
                "Berlin".to_string(),
                "Madrid".to_string(),
                "Paris".to_string(),
                "Rome".to_string(),
            ],
            answer: 2,
            category: "Geography".to_string(),
        },
        Question {
            id: 2,
            question: "Which planet is known as the Red Planet?".to_string(),
            options: vec![
                "Venus".to_string(),
                "Mars".to_string(),
                "Jupiter".to_string(),
                "Saturn".to_string(),
            ],
            answer: 1,
            category: "Science".to_string(),
        },
    ]
}

impl<S: Storage> QuestionStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    pub async fn load(&self) -> Result<Vec<Question>> {
        let _guard = self.lock.lock().await;
        self.load_unlocked().await
    }

    pub async fn save(&self, questions: &[Question]) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.save_unlocked(questions).await
    }

    async fn load_unlocked(&self) -> Result<Vec<Question>> {
        match self.storage.read_file(QUESTIONS_FILE).await {
            Ok(data) => {
                let questions: Vec<Question> = serde_json::from_slice(&data).map_err(|e| {
                    BotError::storage(format!("{} is not valid question JSON: {}", QUESTIONS_FILE, e))
                })?;
                tracing::debug!("📖 Loaded {} questions", questions.len());
                Ok(questions)
            }
            Err(BotError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("📝 {} not found, seeding sample questions", QUESTIONS_FILE);
                let questions = sample_questions();
                self.save_unlocked(&questions).await?;
                Ok(questions)
            }
            Err(e) => Err(e),
        }
    }

    async fn save_unlocked(&self, questions: &[Question]) -> Result<()> {
        let data = serde_json::to_vec_pretty(questions)?;
        self.storage.write_file(QUESTIONS_FILE, &data).await?;
        tracing::debug!("💾 Saved {} questions", questions.len());
        Ok(())
    }

    pub async fn next_id(&self) -> Result<u64> {
        let questions = self.load().await?;
        Ok(next_id_of(&questions))
    }

    pub async fn get(&self, id: u64) -> Result<Option<Question>> {
        let questions = self.load().await?;
        Ok(questions.into_iter().find(|q| q.id == id))
    }

    /// 題組：共用同一個 id 的所有題目
    pub async fn get_set(&self, id: u64) -> Result<Vec<Question>> {
        let questions = self.load().await?;
        Ok(questions.into_iter().filter(|q| q.id == id).collect())
    }

    pub async fn add(&self, question: Question) -> Result<Question> {
        let _guard = self.lock.lock().await;
        let mut questions = self.load_unlocked().await?;
        questions.push(question.clone());
        self.save_unlocked(&questions).await?;
        tracing::info!("➕ Added question #{} ({})", question.id, question.category);
        Ok(question)
    }

    /// 以下一個可用 id 新增題目
    pub async fn add_with_next_id(&self, mut question: Question) -> Result<Question> {
        let _guard = self.lock.lock().await;
        let mut questions = self.load_unlocked().await?;
        question.id = next_id_of(&questions);
        questions.push(question.clone());
        self.save_unlocked(&questions).await?;
        tracing::info!("➕ Added question #{} ({})", question.id, question.category);
        Ok(question)
    }

    /// 刪除所有使用該 id 的題目，回傳是否有刪除
    pub async fn delete(&self, id: u64) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut questions = self.load_unlocked().await?;
        let before = questions.len();
        questions.retain(|q| q.id != id);
        if questions.len() == before {
            return Ok(false);
        }
        self.save_unlocked(&questions).await?;
        tracing::info!("🗑️ Deleted {} question(s) with id {}", before - questions.len(), id);
        Ok(true)
    }

    pub async fn replace_at(&self, index: usize, expected_id: u64, question: Question) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut questions = self.load_unlocked().await?;
        match questions.get_mut(index) {
            Some(slot) if slot.id == expected_id => {
                *slot = question;
            }
            _ => {
                return Err(BotError::NotFoundError {
                    what: format!("question #{} at position {}", expected_id, index + 1),
                })
            }
        }
        self.save_unlocked(&questions).await
    }

    pub async fn categories(&self) -> Result<Vec<String>> {
        let questions = self.load().await?;
        Ok(categories_of(&questions))
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }
}

pub fn next_id_of(questions: &[Question]) -> u64 {
    questions.iter().map(|q| q.id).max().map_or(1, |max| max + 1)
}

pub fn categories_of(questions: &[Question]) -> Vec<String> {
    questions
        .iter()
        .map(|q| {
            if q.category.trim().is_empty() {
                DEFAULT_CATEGORY.to_string()
            } else {
                q.category.clone()
            }
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalStorage;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> QuestionStore<LocalStorage> {
        QuestionStore::new(Arc::new(LocalStorage::new(dir.path())))
    }

    fn question(id: u64, text: &str, category: &str) -> Question {
        Question {
            id,
            question: text.to_string(),
            options: vec!["a".to_string(), "b".to_string()],
            answer: 1,
            category: category.to_string(),
        }
    }

    #[tokio::test]
    async fn test_missing_file_seeds_samples() {
        let dir = TempDir::new().unwrap();
        let questions = store(&dir).load().await.unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].correct_option(), Some("Paris"));
        assert_eq!(questions[1].correct_option(), Some("Mars"));
        assert!(dir.path().join(QUESTIONS_FILE).exists());
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(QUESTIONS_FILE), "{not json").unwrap();

        let result = store(&dir).load().await;
        assert!(matches!(result, Err(BotError::StorageError { .. })));
        // 原檔不可被覆寫
        let raw = std::fs::read_to_string(dir.path().join(QUESTIONS_FILE)).unwrap();
        assert_eq!(raw, "{not json");
    }

    #[tokio::test]
    async fn test_missing_category_defaults_to_general() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(QUESTIONS_FILE),
            r#"[{"id": 4, "question": "Q", "options": ["x", "y"], "answer": 0}]"#,
        )
        .unwrap();

        let questions = store(&dir).load().await.unwrap();
        assert_eq!(questions[0].category, DEFAULT_CATEGORY);
    }

    #[tokio::test]
    async fn test_question_sets_and_delete() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&[]).await.unwrap();
        assert_eq!(store.next_id().await.unwrap(), 1);

        store.add(question(7, "first", "Science")).await.unwrap();
        store.add(question(7, "second", "Science")).await.unwrap();
        store.add(question(3, "third", "History")).await.unwrap();

        assert_eq!(store.next_id().await.unwrap(), 8);
        assert_eq!(store.get_set(7).await.unwrap().len(), 2);
        assert_eq!(store.get(7).await.unwrap().unwrap().question, "first");
        assert_eq!(store.categories().await.unwrap(), vec!["History", "Science"]);

        assert!(store.delete(7).await.unwrap());
        assert!(!store.delete(7).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_replace_at_checks_expected_id() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&[question(1, "old", "General")]).await.unwrap();

        let err = store
            .replace_at(0, 2, question(2, "new", "General"))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::NotFoundError { .. }));

        store
            .replace_at(0, 1, question(1, "new", "General"))
            .await
            .unwrap();
        assert_eq!(store.get(1).await.unwrap().unwrap().question, "new");
    }

    #[tokio::test]
    async fn test_saved_file_keeps_unicode_readable() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&[question(1, "台灣最高的山？", "地理")]).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join(QUESTIONS_FILE)).unwrap();
        assert!(raw.contains("台灣最高的山？"));
    }
}
