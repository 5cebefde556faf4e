use bluemarket_engine::{
    db_types::{FullOrder, NewProduct, Order, OrderId, Product, ProductId, ProductUpdate},
    traits::VendorDashboard,
    MarketError,
    OrderQueries,
    ProductManagement,
};
use mockall::mock;

mock! {
    pub CatalogueManager {}
    impl ProductManagement for CatalogueManager {
        async fn create_product(&self, vendor_id: i64, product: NewProduct) -> Result<Product, MarketError>;
        async fn update_product(&self, id: &ProductId, update: ProductUpdate) -> Result<Option<Product>, MarketError>;
        async fn delete_product(&self, id: &ProductId) -> Result<bool, MarketError>;
        async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, MarketError>;
        async fn fetch_all_products(&self) -> Result<Vec<Product>, MarketError>;
        async fn fetch_products_for_vendor(&self, vendor_id: i64) -> Result<Vec<Product>, MarketError>;
    }
    impl OrderQueries for CatalogueManager {
        async fn fetch_full_order(&self, order_id: &OrderId) -> Result<Option<FullOrder>, MarketError>;
        async fn fetch_order_by_gateway_id(&self, gateway_order_id: &str) -> Result<Option<FullOrder>, MarketError>;
        async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, MarketError>;
        async fn fetch_orders_for_vendor(&self, vendor_id: i64) -> Result<Vec<Order>, MarketError>;
        async fn count_orders_for_vendor(&self, vendor_id: i64) -> Result<i64, MarketError>;
        async fn order_contains_vendor_products(&self, order_id: &OrderId, vendor_id: i64) -> Result<bool, MarketError>;
        async fn vendor_dashboard(&self, vendor_id: i64) -> Result<VendorDashboard, MarketError>;
    }
}
