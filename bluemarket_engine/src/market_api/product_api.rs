//! The vendor catalogue, checkout quotes and the vendor dashboard.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Money, NewProduct, Product, ProductId, ProductUpdate, Role},
    traits::{MarketError, OrderQueries, ProductManagement, Quote, VendorDashboard},
};

pub struct ProductApi<B> {
    db: B,
}

impl<B: Debug> Debug for ProductApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProductApi ({:?})", self.db)
    }
}

fn vendor_only(role: Role) -> Result<i64, MarketError> {
    role.vendor_id().ok_or_else(|| MarketError::Unauthorized("Only vendors can manage products".into()))
}

fn validate_levels(price: Option<Money>, stock: Option<i64>) -> Result<(), MarketError> {
    if price.map(|p| p.is_negative()).unwrap_or(false) {
        return Err(MarketError::InvalidRequest("Price cannot be negative".into()));
    }
    if stock.map(|s| s < 0).unwrap_or(false) {
        return Err(MarketError::InvalidRequest("Stock cannot be negative".into()));
    }
    Ok(())
}

impl<B> ProductApi<B>
where B: ProductManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_product(&self, role: Role, product: NewProduct) -> Result<Product, MarketError> {
        let vendor_id = vendor_only(role)?;
        if product.name.trim().is_empty() {
            return Err(MarketError::InvalidRequest("A product name is required".into()));
        }
        validate_levels(Some(product.price), Some(product.stock))?;
        let product = self.db.create_product(vendor_id, product).await?;
        info!("🛒️ Vendor #{vendor_id} listed {} ({}) at {}", product.name, product.id, product.price);
        Ok(product)
    }

    pub async fn update_product(
        &self,
        role: Role,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Product, MarketError> {
        self.owned_product(role, id).await?;
        if update.name.as_ref().map(|n| n.trim().is_empty()).unwrap_or(false) {
            return Err(MarketError::InvalidRequest("A product name is required".into()));
        }
        validate_levels(update.price, update.stock)?;
        let product = self.db.update_product(id, update).await?.ok_or_else(|| MarketError::product_not_found(id))?;
        debug!("🛒️ Product {id} updated");
        Ok(product)
    }

    pub async fn delete_product(&self, role: Role, id: &ProductId) -> Result<(), MarketError> {
        self.owned_product(role, id).await?;
        if !self.db.delete_product(id).await? {
            return Err(MarketError::product_not_found(id));
        }
        info!("🛒️ Product {id} deleted");
        Ok(())
    }

    pub async fn product(&self, id: &ProductId) -> Result<Product, MarketError> {
        self.db.fetch_product(id).await?.ok_or_else(|| MarketError::product_not_found(id))
    }

    pub async fn all_products(&self) -> Result<Vec<Product>, MarketError> {
        self.db.fetch_all_products().await
    }

    pub async fn my_products(&self, role: Role) -> Result<Vec<Product>, MarketError> {
        let vendor_id = vendor_only(role)?;
        self.db.fetch_products_for_vendor(vendor_id).await
    }

    /// Prices `quantity` units of a product without reserving anything.
    pub async fn quote(&self, id: &ProductId, quantity: i64) -> Result<Quote, MarketError> {
        if quantity <= 0 {
            return Err(MarketError::InvalidRequest(format!("Quantity must be positive, got {quantity}")));
        }
        let product = self.product(id).await?;
        if quantity > product.stock {
            return Err(MarketError::InsufficientStock {
                product_id: id.clone(),
                requested: quantity,
                available: product.stock,
            });
        }
        let total = product
            .price
            .checked_mul(quantity)
            .ok_or_else(|| MarketError::InvalidRequest("Quantity is too large".into()))?;
        Ok(Quote { product, quantity, total })
    }

    async fn owned_product(&self, role: Role, id: &ProductId) -> Result<Product, MarketError> {
        let vendor_id = vendor_only(role)?;
        let product = self.product(id).await?;
        if product.vendor_id != vendor_id {
            warn!("🛒️ Vendor #{vendor_id} tried to modify product {id} owned by vendor #{}", product.vendor_id);
            return Err(MarketError::Unauthorized("You can only modify your own products".into()));
        }
        Ok(product)
    }
}

impl<B> ProductApi<B>
where B: ProductManagement + OrderQueries
{
    pub async fn dashboard(&self, role: Role) -> Result<VendorDashboard, MarketError> {
        let vendor_id =
            role.vendor_id().ok_or_else(|| MarketError::Unauthorized("Only vendors have a dashboard".into()))?;
        self.db.vendor_dashboard(vendor_id).await
    }
}
