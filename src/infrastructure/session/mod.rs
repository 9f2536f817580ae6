//! In-memory session store
//!
//! Sessions live for the life of the process; nothing is persisted.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::traits::SessionStore;
use crate::domain::entities::UserSession;
use crate::application::errors::StorageError;

/// HashMap-backed store keyed by user id
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, UserSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user_id: &str) -> Result<Option<UserSession>, StorageError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(user_id).cloned())
    }

    async fn set_wallet(&self, user_id: &str, wallet: &str) -> Result<(), StorageError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| UserSession::new(user_id))
            .wallet_address = Some(wallet.to_string());
        Ok(())
    }
}
