use chrono::{DateTime, Utc};

/// Per-user session state, held in process memory only.
///
/// Created implicitly the first time a user stores a wallet; lost on
/// restart. The wallet address is the only thing an order flow needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub user_id: String,
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserSession {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            wallet_address: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_wallet(mut self, wallet: impl Into<String>) -> Self {
        self.wallet_address = Some(wallet.into());
        self
    }
}
