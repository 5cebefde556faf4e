use crate::{
    db_types::{FullOrder, Order, OrderId},
    traits::{MarketError, VendorDashboard},
};

#[allow(async_fn_in_trait)]
pub trait OrderQueries {
    /// Fetches an order along with its items, payment and shipping records.
    async fn fetch_full_order(&self, order_id: &OrderId) -> Result<Option<FullOrder>, MarketError>;

    async fn fetch_order_by_gateway_id(&self, gateway_order_id: &str) -> Result<Option<FullOrder>, MarketError>;

    /// A customer's orders, newest first.
    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, MarketError>;

    /// Orders that contain at least one product belonging to the vendor, newest first.
    async fn fetch_orders_for_vendor(&self, vendor_id: i64) -> Result<Vec<Order>, MarketError>;

    /// The number of distinct orders that contain at least one of the vendor's products.
    async fn count_orders_for_vendor(&self, vendor_id: i64) -> Result<i64, MarketError>;

    async fn order_contains_vendor_products(&self, order_id: &OrderId, vendor_id: i64) -> Result<bool, MarketError>;

    async fn vendor_dashboard(&self, vendor_id: i64) -> Result<VendorDashboard, MarketError>;
}
