use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
    Mutex,
};

use gateway_tools::{sign_payment, sign_webhook, verify_payment_signature, verify_webhook_signature, WebhookEvent};
use serde_json::json;

use crate::{
    db_types::Money,
    market_api::order_objects::WebhookNotice,
    traits::{MarketError, PaymentGateway},
};

pub const MOCK_KEY_SECRET: &str = "mock_key_secret";
pub const MOCK_WEBHOOK_SECRET: &str = "mock_webhook_secret";

/// An in-memory payment gateway. It signs and verifies exactly like the real one, but never touches the network.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    counter: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
    created: Arc<Mutex<Vec<(String, Money, String)>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `create_remote_order` call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// `(gateway_order_id, amount, receipt)` for every remote order created so far.
    pub fn created_orders(&self) -> Vec<(String, Money, String)> {
        self.created.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn sign_payment(&self, gateway_order_id: &str, gateway_payment_id: &str) -> String {
        sign_payment(gateway_order_id, gateway_payment_id, MOCK_KEY_SECRET)
    }

    /// A webhook body in the gateway's format, and its signature.
    pub fn webhook(&self, event: &str, gateway_order_id: &str, gateway_payment_id: &str) -> (Vec<u8>, String) {
        let body = json!({
            "entity": "event",
            "event": event,
            "payload": { "payment": { "entity": {
                "id": gateway_payment_id,
                "order_id": gateway_order_id,
                "status": "captured",
            }}},
        })
        .to_string()
        .into_bytes();
        let signature = sign_webhook(&body, MOCK_WEBHOOK_SECRET);
        (body, signature)
    }
}

impl PaymentGateway for MockGateway {
    fn key_id(&self) -> &str {
        "rzp_test_mock"
    }

    fn currency(&self) -> &str {
        "INR"
    }

    async fn create_remote_order(&self, amount: Money, receipt: &str) -> Result<String, MarketError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MarketError::GatewayError("Mock gateway is down".into()));
        }
        let id = format!("order_mock{:06}", self.counter.fetch_add(1, Ordering::SeqCst));
        if let Ok(mut created) = self.created.lock() {
            created.push((id.clone(), amount, receipt.to_string()));
        }
        Ok(id)
    }

    fn verify_payment_signature(&self, gateway_order_id: &str, gateway_payment_id: &str, signature: &str) -> bool {
        verify_payment_signature(gateway_order_id, gateway_payment_id, signature, MOCK_KEY_SECRET)
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        verify_webhook_signature(payload, signature, MOCK_WEBHOOK_SECRET)
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookNotice, MarketError> {
        let event: WebhookEvent =
            serde_json::from_slice(payload).map_err(|e| MarketError::InvalidRequest(e.to_string()))?;
        let captured = event.is_payment_captured();
        match event.payment() {
            Some(p) if captured && p.order_id.is_some() => Ok(WebhookNotice::PaymentCaptured {
                gateway_order_id: p.order_id.clone().unwrap_or_default(),
                gateway_payment_id: p.id.clone(),
            }),
            _ => Ok(WebhookNotice::Other { event: event.event }),
        }
    }
}
