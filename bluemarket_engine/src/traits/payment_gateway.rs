use crate::{db_types::Money, market_api::order_objects::WebhookNotice, traits::MarketError};

/// The engine's view of the external payment provider.
///
/// An implementation is constructed once at start-up and handed to the order flow API.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    /// The public key id the paying client needs to open a checkout.
    fn key_id(&self) -> &str;

    fn currency(&self) -> &str;

    /// Creates an order on the gateway for `amount` and returns the gateway's order id. `receipt` is our order id.
    async fn create_remote_order(&self, amount: Money, receipt: &str) -> Result<String, MarketError>;

    fn verify_payment_signature(&self, gateway_order_id: &str, gateway_payment_id: &str, signature: &str) -> bool;

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool;

    /// Extracts the parts of a webhook body the engine cares about. Only call this after the signature has been
    /// verified.
    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookNotice, MarketError>;
}
