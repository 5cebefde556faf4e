use serde::{Deserialize, Serialize};

use crate::db_types::{FullOrder, Money, Order, Product, Profile};

/// The outcome of a successful stock reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// The unit price of the product at the moment the lock was taken
    pub unit_price: Money,
    /// Stock remaining after the reservation
    pub remaining: i64,
}

/// The result of [`crate::traits::MarketplaceDatabase::confirm_gateway_payment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationResult {
    /// The order moved from `pending` to `confirmed`.
    Confirmed(FullOrder),
    /// The payment had already been confirmed. Nothing changed.
    AlreadyConfirmed(FullOrder),
}

impl ConfirmationResult {
    pub fn order(&self) -> &FullOrder {
        match self {
            ConfirmationResult::Confirmed(o) | ConfirmationResult::AlreadyConfirmed(o) => o,
        }
    }

    pub fn into_order(self) -> FullOrder {
        match self {
            ConfirmationResult::Confirmed(o) | ConfirmationResult::AlreadyConfirmed(o) => o,
        }
    }

    pub fn is_new_confirmation(&self) -> bool {
        matches!(self, ConfirmationResult::Confirmed(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryResult {
    pub cancelled: Vec<Order>,
}

impl ExpiryResult {
    pub fn count(&self) -> usize {
        self.cancelled.len()
    }
}

pub const LOW_STOCK_THRESHOLD: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorDashboard {
    pub product_count: i64,
    pub low_stock: Vec<Product>,
    pub total_sales: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ProfileView {
    Customer { profile: Profile, orders: Vec<Order> },
    Vendor { profile: Profile, order_count: i64 },
    Staff { email: String },
}

/// A priced, unreserved, single-product checkout summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub product: Product,
    pub quantity: i64,
    pub total: Money,
}
