//! 健康檢查與唯讀 JSON API

use crate::config::ExecutionMode;
use crate::core::Stores;
use crate::domain::model::{LeaderboardEntry, Question};
use crate::domain::ports::Storage;
use crate::utils::error::{BotError, Result};
use crate::utils::monitor::SystemMonitor;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

pub const SERVICE_NAME: &str = "quiz-bot";

pub struct AppState<S: Storage + 'static> {
    pub stores: Stores<S>,
    pub mode: ExecutionMode,
    pub leaderboard_size: usize,
    pub monitor: Arc<SystemMonitor>,
}

impl<S: Storage + 'static> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            stores: self.stores.clone(),
            mode: self.mode,
            leaderboard_size: self.leaderboard_size,
            monitor: self.monitor.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub mode: String,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_memory_mb: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionFilter {
    pub category: Option<String>,
}

struct ApiError(BotError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("❌ API request failed: {}", self.0);
        let body = Json(serde_json::json!({
            "error": self.0.user_friendly_message(),
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

impl From<BotError> for ApiError {
    fn from(e: BotError) -> Self {
        ApiError(e)
    }
}

async fn index() -> &'static str {
    "Quiz bot is running"
}

async fn health<S: Storage + 'static>(State(state): State<AppState<S>>) -> Response {
    let stats = state.monitor.get_stats();
    let mut response = HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: state.mode.to_string(),
        uptime_seconds: state.monitor.uptime().as_secs(),
        questions: None,
        users: None,
        memory_mb: stats.as_ref().map(|s| s.memory_usage_mb),
        peak_memory_mb: stats.as_ref().map(|s| s.peak_memory_mb),
        error: None,
    };

    let counts = async {
        let questions = state.stores.questions.count().await?;
        let users = state.stores.users.count().await?;
        Ok::<_, BotError>((questions, users))
    };
    match counts.await {
        Ok((questions, users)) => {
            response.questions = Some(questions);
            response.users = Some(users);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::warn!("⚠️ Health check degraded: {}", e);
            response.status = "degraded".to_string();
            response.error = Some(e.to_string());
            (StatusCode::SERVICE_UNAVAILABLE, Json(response)).into_response()
        }
    }
}

async fn list_questions<S: Storage + 'static>(
    State(state): State<AppState<S>>,
    Query(filter): Query<QuestionFilter>,
) -> std::result::Result<Json<Vec<Question>>, ApiError> {
    let mut questions = state.stores.questions.load().await?;
    if let Some(category) = filter.category.filter(|c| !c.is_empty()) {
        questions.retain(|q| q.category == category);
    }
    Ok(Json(questions))
}

async fn list_categories<S: Storage + 'static>(
    State(state): State<AppState<S>>,
) -> std::result::Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.stores.questions.categories().await?))
}

async fn leaderboard<S: Storage + 'static>(
    State(state): State<AppState<S>>,
) -> std::result::Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    Ok(Json(
        state.stores.users.leaderboard(state.leaderboard_size).await?,
    ))
}

pub fn router<S: Storage + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health::<S>))
        .route("/api/questions", get(list_questions::<S>))
        .route("/api/categories", get(list_categories::<S>))
        .route("/api/leaderboard", get(leaderboard::<S>))
        .with_state(state)
}

/// 綁定 host:port 並服務到收到關閉訊號為止
pub async fn serve<S: Storage + 'static>(
    state: AppState<S>,
    bind_address: String,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!("🌐 Web server listening on http://{}", bind_address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    tracing::info!("🛑 Web server stopped");
    Ok(())
}
