//! HTTP 渠道
//!
//! `POST /api/messages` 接收一条活动，返回回复数组；`GET /health` 健康检查。
//! 同一会话的回合用会话级互斥锁串行执行。

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::gateway::{Activity, BotAdapter, OutboundMessage};

/// 会话锁表：conversation id -> 锁
type ConversationLocks = Mutex<HashMap<String, Arc<Mutex<()>>>>;

pub struct HttpState {
    pub adapter: BotAdapter,
    locks: ConversationLocks,
}

impl HttpState {
    pub fn new(adapter: BotAdapter) -> Self {
        Self {
            adapter,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn conversation_lock(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 回合结束后，没有其他请求持有或等待时移除该会话的锁
    async fn release_conversation_lock(&self, conversation_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // 表中一份 + 这里一份
        if Arc::strong_count(&lock) == 2 {
            locks.remove(conversation_id);
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn create_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/api/messages", post(handle_messages))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn handle_messages(
    State(state): State<Arc<HttpState>>,
    Json(activity): Json<Activity>,
) -> Result<Json<Vec<OutboundMessage>>, (StatusCode, String)> {
    if activity.conversation.id.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "conversation.id is required".to_string()));
    }

    let conversation_id = activity.conversation.id.clone();
    let lock = state.conversation_lock(&conversation_id).await;
    let replies = {
        let _guard = lock.lock().await;
        tracing::debug!(conversation = %conversation_id, "http turn");
        state.adapter.process_activity(activity).await
    };
    state.release_conversation_lock(&conversation_id, lock).await;

    Ok(Json(replies))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::ConciergeBot;
    use crate::recognizer::RuleBasedRecognizer;
    use crate::state::MemoryStorage;

    fn state() -> Arc<HttpState> {
        let bot = ConciergeBot::builder()
            .with_storage(Arc::new(MemoryStorage::new()))
            .with_recognizer(Arc::new(RuleBasedRecognizer::new()))
            .build()
            .unwrap();
        Arc::new(HttpState::new(BotAdapter::new(Arc::new(bot))))
    }

    #[tokio::test]
    async fn test_messages_endpoint_returns_replies() {
        let state = state();
        let activity = Activity::message("http", "conv-1", "user-1", "hello");
        let Json(replies) = handle_messages(State(state.clone()), Json(activity))
            .await
            .unwrap();
        assert_eq!(replies[0].body(), "What is your name?");
        assert!(state.locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_conversation_is_rejected() {
        let activity = Activity::message("http", "", "user-1", "hello");
        let (status, _) = handle_messages(State(state()), Json(activity)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_same_conversation_shares_lock() {
        let state = state();
        let a = state.conversation_lock("conv-1").await;
        let b = state.conversation_lock("conv-1").await;
        assert!(Arc::ptr_eq(&a, &b));

        // 仍有其他持有者时保留
        state.release_conversation_lock("conv-1", a).await;
        assert_eq!(state.locks.lock().await.len(), 1);
        state.release_conversation_lock("conv-1", b).await;
        assert!(state.locks.lock().await.is_empty());
    }
}
