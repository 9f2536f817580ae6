use async_trait::async_trait;
use crate::domain::entities::UserSession;
use crate::application::errors::StorageError;

/// SessionStore trait - per-user session state keyed by user id
///
/// Replaces ambient per-user state with an explicit, injectable store so
/// the dispatcher can be tested against an in-memory implementation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a user's session, if one exists
    async fn get(&self, user_id: &str) -> Result<Option<UserSession>, StorageError>;

    /// Store a user's wallet address, creating the session on first write
    async fn set_wallet(&self, user_id: &str, wallet: &str) -> Result<(), StorageError>;

    /// Shortcut: the stored wallet address, if any
    async fn wallet(&self, user_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(user_id).await?.and_then(|s| s.wallet_address))
    }
}
