use serde::{Deserialize, Serialize};

use crate::db_types::{Order, PaymentMethod};

/// Emitted when an order's payment settles: immediately for cash-on-delivery, or when a gateway payment is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub method: PaymentMethod,
}

impl OrderPaidEvent {
    pub fn new(order: Order, method: PaymentMethod) -> Self {
        Self { order, method }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnulReason {
    /// Cancelled by the customer or by staff
    Cancelled,
    /// Cancelled by the unpaid-order expiry worker
    Expired,
}

/// Emitted when an order is cancelled and its stock returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub reason: AnnulReason,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order, reason: AnnulReason) -> Self {
        Self { order, reason }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderPaid(OrderPaidEvent),
    OrderAnnulled(OrderAnnulledEvent),
}
