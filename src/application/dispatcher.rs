//! Command dispatcher - Maps chat events to replies
//!
//! Pure orchestration over the session store and the payment checker; knows
//! nothing about Telegram. The update loop renders the returned replies
//! through whichever `Bot` adapter is running.

use std::sync::Arc;

use crate::domain::traits::{KeyboardButton, PaymentChecker, SessionStore};
use crate::application::errors::BotError;

/// Callback data carried by the "I Paid" inline button
pub const CONFIRM_CALLBACK: &str = "check_payment";

/// A reply to a chat event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    WithKeyboard {
        text: String,
        buttons: Vec<Vec<KeyboardButton>>,
    },
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Text(t) => t,
            Reply::WithKeyboard { text, .. } => text,
        }
    }
}

/// Reply to the "I Paid" button press.
///
/// Mirrors the two-step flow on the wire: the original prompt message is
/// edited in place, then the verdict (if any) arrives as a fresh message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackReply {
    /// Replacement text for the message carrying the button
    pub edit: String,
    /// Verdict sent as a follow-up message, absent when no check ran
    pub followup: Option<String>,
}

/// Routes the four supported chat events to canned or templated replies
pub struct Dispatcher {
    sessions: Arc<dyn SessionStore>,
    checker: Arc<dyn PaymentChecker>,
    receiver_address: String,
    /// Whole tokens asked for in the buy prompt
    price: f64,
    /// Whole-token threshold the balance check must meet
    min_amount: f64,
}

impl Dispatcher {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        checker: Arc<dyn PaymentChecker>,
        receiver_address: impl Into<String>,
        price: f64,
        min_amount: f64,
    ) -> Self {
        Self {
            sessions,
            checker,
            receiver_address: receiver_address.into(),
            price,
            min_amount,
        }
    }

    /// /start - welcome message
    pub fn start(&self) -> Reply {
        Reply::Text(
            "👋 Welcome to GoodMarket Bot!\n\n\
             To purchase a product, use /buy.\n\
             To set your wallet, use /wallet [your_wallet_address]"
                .to_string(),
        )
    }

    /// /wallet <address> - store the user's wallet in the session
    ///
    /// Anything other than exactly one argument leaves a previously stored
    /// wallet untouched and returns the usage text.
    pub async fn set_wallet(&self, user_id: &str, args: &[String]) -> Result<Reply, BotError> {
        let [address] = args else {
            return Ok(Reply::Text(
                "❗ Usage: /wallet [your_wallet_address]".to_string(),
            ));
        };

        self.sessions.set_wallet(user_id, address).await?;
        tracing::info!("Stored wallet for user {}", user_id);
        Ok(Reply::Text(
            "✅ Wallet address saved. Now you can proceed with /buy.".to_string(),
        ))
    }

    /// /buy - payment instructions with the "I Paid" button
    pub fn buy(&self) -> Reply {
        Reply::WithKeyboard {
            text: format!(
                "🛒 Please send *{} G$* to the following wallet address:\n`{}`\n\n\
                 After sending, click the button below to confirm.",
                self.price, self.receiver_address,
            ),
            buttons: vec![vec![
                KeyboardButton::new("✅ I Paid").with_callback(CONFIRM_CALLBACK),
            ]],
        }
    }

    /// "I Paid" button press - the only path into the payment checker
    pub async fn confirm_payment(&self, user_id: &str) -> Result<CallbackReply, BotError> {
        let Some(wallet) = self.sessions.wallet(user_id).await? else {
            return Ok(CallbackReply {
                edit: "❗ Please set your wallet address first using /wallet [your_wallet_address]."
                    .to_string(),
                followup: None,
            });
        };

        let followup = match self.checker.check_payment(&wallet, self.min_amount).await {
            Ok(true) => {
                tracing::info!("Payment confirmed for user {} (wallet {})", user_id, wallet);
                "✅ Payment confirmed! Thank you for your order. Wait 5–10 minutes for delivery."
                    .to_string()
            }
            Ok(false) => {
                "❌ Payment not found. Please try again or contact support.".to_string()
            }
            Err(e) => {
                tracing::warn!("Payment check failed for user {}: {}", user_id, e);
                format!("⚠️ Error checking payment: {}", e)
            }
        };

        Ok(CallbackReply {
            edit: "🔍 Checking payment on Celo blockchain...".to_string(),
            followup: Some(followup),
        })
    }

    /// Anything that looks like a command but isn't one of ours
    pub fn unknown(&self, name: &str) -> Reply {
        Reply::Text(format!(
            "Unknown command: /{}\nTry /start for the list of commands.",
            name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::application::errors::PaymentError;
    use crate::infrastructure::session::InMemorySessionStore;

    const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

    /// Checker over a fixed fake balance, recording whether it was called
    struct MockChecker {
        balance: u128,
        fail_with_network_error: bool,
        invoked: AtomicBool,
    }

    impl MockChecker {
        fn with_balance(balance: u128) -> Arc<Self> {
            Arc::new(Self {
                balance,
                fail_with_network_error: false,
                invoked: AtomicBool::new(false),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                balance: 0,
                fail_with_network_error: true,
                invoked: AtomicBool::new(false),
            })
        }

        fn was_invoked(&self) -> bool {
            self.invoked.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentChecker for MockChecker {
        async fn check_payment(&self, _address: &str, min_amount: f64) -> Result<bool, PaymentError> {
            self.invoked.store(true, Ordering::SeqCst);
            if self.fail_with_network_error {
                return Err(PaymentError::Network("connection refused".to_string()));
            }
            Ok(self.balance >= (min_amount * 1e18) as u128)
        }
    }

    fn dispatcher(checker: Arc<MockChecker>) -> (Dispatcher, Arc<InMemorySessionStore>) {
        let sessions = Arc::new(InMemorySessionStore::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&sessions) as Arc<dyn SessionStore>,
            checker,
            "0xRECEIVER",
            10.0,
            1.0,
        );
        (dispatcher, sessions)
    }

    #[tokio::test]
    async fn buy_shows_receiver_and_paid_button() {
        let (dispatcher, _) = dispatcher(MockChecker::with_balance(0));

        let Reply::WithKeyboard { text, buttons } = dispatcher.buy() else {
            panic!("buy should carry a keyboard");
        };
        assert!(text.contains("0xRECEIVER"));
        assert!(text.contains("10 G$"));
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0][0].text, "✅ I Paid");
        assert_eq!(buttons[0][0].callback_data.as_deref(), Some(CONFIRM_CALLBACK));
    }

    #[tokio::test]
    async fn wallet_requires_exactly_one_argument() {
        let (dispatcher, sessions) = dispatcher(MockChecker::with_balance(0));

        let reply = dispatcher.set_wallet("7", &[]).await.unwrap();
        assert!(reply.text().contains("Usage: /wallet"));
        assert!(sessions.wallet("7").await.unwrap().is_none());

        let too_many = vec!["0xabc".to_string(), "0xdef".to_string()];
        let reply = dispatcher.set_wallet("7", &too_many).await.unwrap();
        assert!(reply.text().contains("Usage: /wallet"));
        assert!(sessions.wallet("7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn bad_arity_leaves_previous_wallet_untouched() {
        let (dispatcher, sessions) = dispatcher(MockChecker::with_balance(0));

        let args = vec!["0xABC123".to_string()];
        let reply = dispatcher.set_wallet("7", &args).await.unwrap();
        assert!(reply.text().contains("Wallet address saved"));

        dispatcher.set_wallet("7", &[]).await.unwrap();
        assert_eq!(sessions.wallet("7").await.unwrap().as_deref(), Some("0xABC123"));
    }

    #[tokio::test]
    async fn confirm_without_wallet_never_invokes_checker() {
        let checker = MockChecker::with_balance(2 * ONE_TOKEN);
        let (dispatcher, _) = dispatcher(Arc::clone(&checker));

        let reply = dispatcher.confirm_payment("7").await.unwrap();
        assert!(reply.edit.contains("set your wallet address first"));
        assert!(reply.followup.is_none());
        assert!(!checker.was_invoked());
    }

    #[tokio::test]
    async fn sufficient_balance_confirms_payment() {
        let checker = MockChecker::with_balance(2 * ONE_TOKEN);
        let (dispatcher, _) = dispatcher(Arc::clone(&checker));

        dispatcher
            .set_wallet("7", &["0xABC...123".to_string()])
            .await
            .unwrap();
        let reply = dispatcher.confirm_payment("7").await.unwrap();

        assert!(reply.edit.contains("Checking payment"));
        assert!(reply.followup.unwrap().contains("Payment confirmed"));
        assert!(checker.was_invoked());
    }

    #[tokio::test]
    async fn zero_balance_is_payment_not_found() {
        let checker = MockChecker::with_balance(0);
        let (dispatcher, _) = dispatcher(Arc::clone(&checker));

        dispatcher.set_wallet("7", &["0xabc".to_string()]).await.unwrap();
        let reply = dispatcher.confirm_payment("7").await.unwrap();

        assert!(reply.followup.unwrap().contains("Payment not found"));
    }

    #[tokio::test]
    async fn exact_threshold_balance_confirms() {
        let checker = MockChecker::with_balance(ONE_TOKEN);
        let (dispatcher, _) = dispatcher(Arc::clone(&checker));

        dispatcher.set_wallet("7", &["0xabc".to_string()]).await.unwrap();
        let reply = dispatcher.confirm_payment("7").await.unwrap();

        assert!(reply.followup.unwrap().contains("Payment confirmed"));
    }

    #[tokio::test]
    async fn checker_failure_is_rendered_not_propagated() {
        let checker = MockChecker::failing();
        let (dispatcher, _) = dispatcher(Arc::clone(&checker));

        dispatcher.set_wallet("7", &["0xabc".to_string()]).await.unwrap();
        let reply = dispatcher.confirm_payment("7").await.unwrap();

        let followup = reply.followup.unwrap();
        assert!(followup.contains("Error checking payment"));
        assert!(followup.contains("connection refused"));
    }

    #[tokio::test]
    async fn sessions_are_per_user() {
        let checker = MockChecker::with_balance(2 * ONE_TOKEN);
        let (dispatcher, _) = dispatcher(Arc::clone(&checker));

        dispatcher.set_wallet("alice", &["0xaaa".to_string()]).await.unwrap();

        let reply = dispatcher.confirm_payment("bob").await.unwrap();
        assert!(reply.edit.contains("set your wallet address first"));
        assert!(!checker.was_invoked());
    }
}
