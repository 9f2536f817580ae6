use async_trait::async_trait;
use crate::application::errors::PaymentError;

/// PaymentChecker trait - answers whether an address holds at least
/// `min_amount` of the payment token
///
/// A balance read is a weak proxy for "paid for this order": it cannot tell
/// a fresh transfer from a pre-existing holding, and nothing marks an order
/// fulfilled. The live implementation reads a public token balance; tests
/// inject a mock.
#[async_trait]
pub trait PaymentChecker: Send + Sync {
    /// Check whether `address` holds at least `min_amount` whole tokens.
    ///
    /// Failures (bad address, transport, RPC error) surface as distinct
    /// `PaymentError` variants, never as a silent `false`.
    async fn check_payment(&self, address: &str, min_amount: f64) -> Result<bool, PaymentError>;
}
