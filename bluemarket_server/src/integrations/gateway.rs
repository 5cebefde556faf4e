use bluemarket_engine::{db_types::Money, order_objects::WebhookNotice, MarketError, PaymentGateway};
use gateway_tools::{GatewayApi, GatewayApiError, GatewayConfig, WebhookEvent};
use log::*;

/// The live payment gateway. A thin adapter that exposes [`GatewayApi`] to the engine as a [`PaymentGateway`].
#[derive(Clone)]
pub struct RazorpayGateway {
    api: GatewayApi,
}

impl RazorpayGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        let api = GatewayApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentGateway for RazorpayGateway {
    fn key_id(&self) -> &str {
        self.api.key_id()
    }

    fn currency(&self) -> &str {
        self.api.currency()
    }

    async fn create_remote_order(&self, amount: Money, receipt: &str) -> Result<String, MarketError> {
        let order = self.api.create_order(amount, receipt).await.map_err(|e| {
            error!("💳️ Could not create a gateway order for {receipt}. {e}");
            MarketError::GatewayError(e.to_string())
        })?;
        Ok(order.id)
    }

    fn verify_payment_signature(&self, gateway_order_id: &str, gateway_payment_id: &str, signature: &str) -> bool {
        self.api.verify_payment_signature(gateway_order_id, gateway_payment_id, signature)
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        self.api.verify_webhook_signature(payload, signature)
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookNotice, MarketError> {
        parse_webhook_body(payload)
    }
}

pub fn parse_webhook_body(payload: &[u8]) -> Result<WebhookNotice, MarketError> {
    let event: WebhookEvent = serde_json::from_slice(payload).map_err(|e| {
        warn!("💳️ Could not parse webhook body. {e}");
        MarketError::InvalidRequest(format!("Malformed webhook body. {e}"))
    })?;
    let notice = match (event.is_payment_captured(), event.payment()) {
        (true, Some(payment)) => match &payment.order_id {
            Some(gateway_order_id) => WebhookNotice::PaymentCaptured {
                gateway_order_id: gateway_order_id.clone(),
                gateway_payment_id: payment.id.clone(),
            },
            None => {
                warn!("💳️ Captured payment {} is not attached to an order", payment.id);
                WebhookNotice::Other { event: event.event }
            },
        },
        _ => WebhookNotice::Other { event: event.event },
    };
    Ok(notice)
}
