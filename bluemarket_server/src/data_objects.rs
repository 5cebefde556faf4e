use std::fmt::Display;

use bluemarket_engine::{
    db_types::{CartLine, NewOrder, OrderStatus, PaymentMethod, ProductId, ProfileKind, Role},
    order_objects::PaymentCallback,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// The profile to log in as. Omit it for staff accounts, or to use whichever profile the account holds.
    #[serde(default)]
    pub role: Option<ProfileKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub account_id: i64,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<CartLine>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub address: Option<String>,
}

impl PlaceOrderRequest {
    pub fn into_new_order(self, customer_id: i64) -> NewOrder {
        let order = NewOrder::new(customer_id, self.items, self.payment_method);
        match self.address {
            Some(address) => order.with_address(address),
            None => order,
        }
    }
}

/// The signed confirmation the checkout widget hands back to the client. The gateway's own field names are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentVerification {
    #[serde(alias = "razorpay_order_id")]
    pub gateway_order_id: String,
    #[serde(alias = "razorpay_payment_id")]
    pub gateway_payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub signature: String,
}

impl From<PaymentVerification> for PaymentCallback {
    fn from(value: PaymentVerification) -> Self {
        PaymentCallback {
            gateway_order_id: value.gateway_order_id,
            gateway_payment_id: value.gateway_payment_id,
            signature: value.signature,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}
