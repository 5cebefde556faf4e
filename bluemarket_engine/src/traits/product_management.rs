use crate::{
    db_types::{NewProduct, Product, ProductId, ProductUpdate},
    traits::MarketError,
};

#[allow(async_fn_in_trait)]
pub trait ProductManagement {
    async fn create_product(&self, vendor_id: i64, product: NewProduct) -> Result<Product, MarketError>;

    /// Applies the non-empty fields of `update`. Returns `None` if the product does not exist.
    async fn update_product(&self, id: &ProductId, update: ProductUpdate) -> Result<Option<Product>, MarketError>;

    /// Returns `false` if the product did not exist.
    async fn delete_product(&self, id: &ProductId) -> Result<bool, MarketError>;

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, MarketError>;

    async fn fetch_all_products(&self) -> Result<Vec<Product>, MarketError>;

    async fn fetch_products_for_vendor(&self, vendor_id: i64) -> Result<Vec<Product>, MarketError>;
}
