use chrono::Duration;

use crate::{
    db_types::{FullOrder, GatewayConfirmation, NewOrder, OrderId, OrderStatus, Payment, ProductId},
    traits::{ConfirmationResult, ExpiryResult, MarketError, OrderQueries, Reservation},
};

/// The transactional core of the marketplace.
///
/// Every method runs in its own database transaction. Nothing is visible to other callers until that transaction
/// commits, and every error path rolls it back.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + OrderQueries {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Reserve `quantity` units of a single product.
    ///
    /// Fails with [`MarketError::InsufficientStock`] (and changes nothing) if there is not enough stock.
    async fn reserve_stock(&self, product_id: &ProductId, quantity: i64) -> Result<Reservation, MarketError>;

    /// Return `quantity` units of a product to stock. Returns the new stock level.
    async fn restore_stock(&self, product_id: &ProductId, quantity: i64) -> Result<i64, MarketError>;

    /// Assemble an order from a list of cart lines.
    ///
    /// In a single transaction:
    /// * every line is reserved, in product id order. Any shortfall aborts the whole order.
    /// * the order, its items (with the unit price captured at reservation time), a pending payment and a pending
    ///   shipping record are inserted.
    /// * cash-on-delivery orders are settled immediately: the payment becomes `success` and the order `shipping`.
    async fn place_order(&self, order: NewOrder) -> Result<FullOrder, MarketError>;

    /// Record the id the payment gateway assigned to this order's payment.
    async fn attach_gateway_order(&self, order_id: &OrderId, gateway_order_id: &str) -> Result<Payment, MarketError>;

    /// Apply a verified gateway confirmation. The caller is responsible for checking the signature.
    ///
    /// This is idempotent. A payment that is already `success` yields [`ConfirmationResult::AlreadyConfirmed`] and
    /// nothing else changes. An order that is no longer `pending` yields [`MarketError::InvalidTransition`].
    async fn confirm_gateway_payment(
        &self,
        confirmation: GatewayConfirmation,
    ) -> Result<ConfirmationResult, MarketError>;

    /// Cancel an order, returning every reserved unit to stock and marking the payment as failed.
    ///
    /// Only `pending` and `shipping` orders can be cancelled.
    async fn cancel_order(&self, order_id: &OrderId) -> Result<FullOrder, MarketError>;

    /// Move an order along the fulfilment path (`confirmed → shipping → shipped → delivered`), updating the shipping
    /// record as required.
    async fn advance_fulfillment(&self, order_id: &OrderId, status: OrderStatus) -> Result<FullOrder, MarketError>;

    /// Cancel every gateway order that has been `pending` for longer than `limit`.
    async fn expire_unpaid_orders(&self, limit: Duration) -> Result<ExpiryResult, MarketError>;
}
