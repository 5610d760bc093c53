use crate::domain::model::{LeaderboardEntry, Player, UserStats};
use crate::domain::ports::Storage;
use crate::utils::error::{BotError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const USERS_FILE: &str = "users.json";

type UserMap = HashMap<String, UserStats>;

/// 使用者統計：users.json，以十進位 user id 字串為鍵
pub struct UserStore<S: Storage> {
    storage: Arc<S>,
    lock: Mutex<()>,
}

impl<S: Storage> UserStore<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    async fn load_unlocked(&self) -> Result<UserMap> {
        match self.storage.read_file(USERS_FILE).await {
            Ok(data) => serde_json::from_slice(&data).map_err(|e| {
                BotError::storage(format!("{} is not valid user JSON: {}", USERS_FILE, e))
            }),
            Err(BotError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(UserMap::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn save_unlocked(&self, users: &UserMap) -> Result<()> {
        let data = serde_json::to_vec_pretty(users)?;
        self.storage.write_file(USERS_FILE, &data).await
    }

    async fn update<F>(&self, user_id: i64, apply: F) -> Result<UserStats>
    where
        F: FnOnce(&mut UserStats),
    {
        let _guard = self.lock.lock().await;
        let mut users = self.load_unlocked().await?;
        let entry = users.entry(user_id.to_string()).or_default();
        apply(entry);
        let updated = entry.clone();
        self.save_unlocked(&users).await?;
        Ok(updated)
    }

    pub async fn get(&self, user_id: i64) -> Result<UserStats> {
        let _guard = self.lock.lock().await;
        let users = self.load_unlocked().await?;
        Ok(users.get(&user_id.to_string()).cloned().unwrap_or_default())
    }

    /// 只在尚未存在時建立紀錄，回傳是否為新使用者
    pub async fn register(&self, player: &Player) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut users = self.load_unlocked().await?;
        let key = player.id.to_string();
        if users.contains_key(&key) {
            return Ok(false);
        }
        users.insert(
            key,
            UserStats {
                name: player.name.clone(),
                username: player.username.clone(),
                last_active: Some(chrono::Utc::now().to_rfc3339()),
                ..UserStats::default()
            },
        );
        self.save_unlocked(&users).await?;
        tracing::info!("👤 Registered user {} ({})", player.name, player.id);
        Ok(true)
    }

    pub async fn record_answer(
        &self,
        player: &Player,
        correct: bool,
        negative_marking: f64,
    ) -> Result<UserStats> {
        self.update(player.id, |stats| {
            stats.name = player.name.clone();
            if player.username.is_some() {
                stats.username = player.username.clone();
            }
            stats.total_answers += 1;
            if correct {
                stats.correct_answers += 1;
                stats.score += 1.0;
            } else {
                stats.score -= negative_marking;
            }
            stats.last_active = Some(chrono::Utc::now().to_rfc3339());
        })
        .await
    }

    pub async fn record_quiz_taken(&self, user_id: i64, name: &str) -> Result<UserStats> {
        self.update(user_id, |stats| {
            if stats.name.is_empty() {
                stats.name = name.to_string();
            }
            stats.quizzes_taken += 1;
        })
        .await
    }

    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        Ok(self.ranked().await?.into_iter().take(limit).collect())
    }

    /// 全部使用者依分數排序
    pub async fn ranked(&self) -> Result<Vec<LeaderboardEntry>> {
        let _guard = self.lock.lock().await;
        let users = self.load_unlocked().await?;

        let mut entries: Vec<LeaderboardEntry> = users
            .into_iter()
            .filter_map(|(id, stats)| {
                let user_id = id.parse().ok()?;
                Some(LeaderboardEntry {
                    user_id,
                    name: if stats.name.is_empty() {
                        format!("User {}", user_id)
                    } else {
                        stats.name
                    },
                    score: stats.score,
                    correct_answers: stats.correct_answers,
                    total_answers: stats.total_answers,
                })
            })
            .collect();

        entries.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(b.correct_answers.cmp(&a.correct_answers))
                .then(a.user_id.cmp(&b.user_id))
        });
        Ok(entries)
    }

    pub async fn count(&self) -> Result<usize> {
        let _guard = self.lock.lock().await;
        Ok(self.load_unlocked().await?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LocalStorage;
    use tempfile::TempDir;

    fn player(id: i64, name: &str) -> Player {
        Player {
            id,
            name: name.to_string(),
            username: None,
        }
    }

    #[tokio::test]
    async fn test_unknown_user_has_default_stats() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::new(Arc::new(LocalStorage::new(dir.path())));

        let stats = store.get(99).await.unwrap();
        assert_eq!(stats.total_answers, 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_only_once() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::new(Arc::new(LocalStorage::new(dir.path())));

        assert!(store.register(&player(1, "Ada")).await.unwrap());
        store.record_quiz_taken(1, "Ada").await.unwrap();
        assert!(!store.register(&player(1, "Ada")).await.unwrap());
        assert_eq!(store.get(1).await.unwrap().quizzes_taken, 1);
    }

    #[tokio::test]
    async fn test_record_answer_applies_negative_marking() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::new(Arc::new(LocalStorage::new(dir.path())));
        let ada = player(1, "Ada");

        store.record_answer(&ada, true, 0.25).await.unwrap();
        store.record_answer(&ada, true, 0.25).await.unwrap();
        let stats = store.record_answer(&ada, false, 0.25).await.unwrap();

        assert_eq!(stats.total_answers, 3);
        assert_eq!(stats.correct_answers, 2);
        assert!((stats.score - 1.75).abs() < f64::EPSILON);
        assert!(stats.last_active.is_some());
    }

    #[tokio::test]
    async fn test_leaderboard_order() {
        let dir = TempDir::new().unwrap();
        let store = UserStore::new(Arc::new(LocalStorage::new(dir.path())));

        store.record_answer(&player(1, "Low"), false, 0.25).await.unwrap();
        store.record_answer(&player(2, "High"), true, 0.25).await.unwrap();
        store.record_answer(&player(3, "Mid"), true, 0.25).await.unwrap();
        store.record_answer(&player(3, "Mid"), false, 0.25).await.unwrap();

        let board = store.leaderboard(2).await.unwrap();
        let names: Vec<_> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["High", "Mid"]);
    }
}
