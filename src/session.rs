//! Per-user session store.
//!
//! Tracks whether a user is inside a conversation and which project they are
//! currently working on. The store is injected wherever it is needed so tests
//! get their own isolated instance.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::db::PersistedProject;

/// Session data kept for a user between messages
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSession {
    pub in_conversation: bool,
    pub active_project: Option<i64>,
    pub project: Option<PersistedProject>,
}

/// Key-value store of sessions by Telegram user id
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: i64) -> Option<UserSession>;
    async fn set(&self, user_id: i64, session: UserSession);
    async fn delete(&self, user_id: i64);
}

/// Session store backed by a process-local map
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<i64, UserSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: i64) -> Option<UserSession> {
        self.sessions.read().await.get(&user_id).cloned()
    }

    async fn set(&self, user_id: i64, session: UserSession) {
        self.sessions.write().await.insert(user_id, session);
    }

    async fn delete(&self, user_id: i64) {
        self.sessions.write().await.remove(&user_id);
    }
}

/// Mark the user as being inside a conversation
pub async fn begin_conversation(store: &dyn SessionStore, user_id: i64) {
    let mut session = store.get(user_id).await.unwrap_or_default();
    session.in_conversation = true;
    store.set(user_id, session).await;
    debug!(user_id, "Conversation started");
}

/// Clear the conversation flag, keeping the active project
pub async fn end_conversation(store: &dyn SessionStore, user_id: i64) {
    if let Some(mut session) = store.get(user_id).await {
        session.in_conversation = false;
        store.set(user_id, session).await;
        debug!(user_id, "Conversation ended");
    }
}

/// Point the user's active project at a freshly created project
pub async fn set_active_project(store: &dyn SessionStore, user_id: i64, project: PersistedProject) {
    let mut session = store.get(user_id).await.unwrap_or_default();
    session.active_project = Some(project.project_id);
    session.project = Some(project);
    store.set(user_id, session).await;
}
