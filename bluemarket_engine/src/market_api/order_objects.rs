use serde::{Deserialize, Serialize};

use crate::db_types::{FullOrder, Money, OrderId};

/// Everything the paying client needs to open the gateway checkout for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCheckout {
    pub key_id: String,
    pub gateway_order_id: String,
    pub amount: Money,
    pub currency: String,
    pub receipt: OrderId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order: FullOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout: Option<GatewayCheckout>,
}

/// What the paying client sends back after a successful gateway checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

/// The engine's reading of a gateway webhook body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookNotice {
    PaymentCaptured { gateway_order_id: String, gateway_payment_id: String },
    /// Any other event. Acknowledged without side effects.
    Other { event: String },
}

/// How a (correctly signed) webhook was handled. Every variant is acknowledged to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Confirmed { order_id: OrderId },
    AlreadyConfirmed { order_id: OrderId },
    /// The order was no longer payable (e.g. cancelled) when the capture arrived. Needs a manual refund.
    NotPayable { gateway_order_id: String },
    /// No payment record carries this gateway order id.
    UnknownOrder { gateway_order_id: String },
    Ignored { event: String },
}
