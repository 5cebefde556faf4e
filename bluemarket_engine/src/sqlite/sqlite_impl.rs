//! `SqliteDatabase` is the concrete marketplace backend.
//!
//! It implements all the traits defined in the [`crate::traits`] module on top of the low-level functions in
//! [`super::db`].
use std::{fmt::Debug, time::Duration};

use chrono::Utc;
use log::*;
use sqlx::{SqliteConnection, SqlitePool};

use super::db::{accounts, db_url, new_pool, orders, payments, products, shipping, DEFAULT_BUSY_TIMEOUT};
use crate::{
    db_types::{
        Account,
        FullOrder,
        GatewayConfirmation,
        Money,
        NewOrder,
        NewProduct,
        Order,
        OrderId,
        OrderStatus,
        Payment,
        PaymentMethod,
        PaymentStatus,
        Product,
        ProductId,
        ProductUpdate,
        Profile,
        ProfileKind,
        DEFAULT_SHIPPING_ADDRESS,
    },
    helpers::canonical_cart,
    traits::{
        AccountManagement,
        ConfirmationResult,
        ExpiryResult,
        MarketError,
        MarketplaceDatabase,
        OrderQueries,
        ProductManagement,
        Reservation,
        VendorDashboard,
        LOW_STOCK_THRESHOLD,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the `BM_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        SqliteDatabase::new_with_options(url, max_connections, DEFAULT_BUSY_TIMEOUT).await
    }

    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        busy_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections, busy_timeout).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MarketError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }

    /// Works out which conflict message applies to an email that is already registered.
    async fn registration_conflict(&self, email: &str, kind: ProfileKind) -> Result<MarketError, MarketError> {
        let mut conn = self.pool.acquire().await?;
        let Some(existing) = accounts::fetch_account_by_email(email, &mut conn).await? else {
            return Ok(account_exists());
        };
        let other = kind.other();
        if accounts::fetch_profile_for_account(existing.id, other, &mut conn).await?.is_some() {
            return Ok(MarketError::RegistrationConflict(format!(
                "This email is already registered as a {other}. Please use a different email to register as a {kind}."
            )));
        }
        Ok(account_exists())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn account_exists() -> MarketError {
    MarketError::RegistrationConflict("An account with this email already exists. Please log in.".into())
}

fn map_unique_violation(e: sqlx::Error) -> MarketError {
    if is_unique_violation(&e) {
        account_exists()
    } else {
        e.into()
    }
}

async fn cancel_in_tx(id: &OrderId, conn: &mut SqliteConnection) -> Result<FullOrder, MarketError> {
    orders::lock_for_transition(id, OrderStatus::Cancelled, conn).await?;
    let mut items = orders::fetch_items(id, conn).await?;
    items.sort_by(|a, b| a.product_id.cmp(&b.product_id));
    for item in &items {
        match products::restore(&item.product_id, item.quantity, conn).await {
            Ok(stock) => trace!("🗃️ Returned {} of {} to stock ({stock})", item.quantity, item.product_id),
            Err(MarketError::NotFound(_)) => {
                warn!("🗃️ Product {} from order {id} no longer exists. Its stock cannot be restored.", item.product_id)
            },
            Err(e) => return Err(e),
        }
    }
    orders::update_order_status(id, OrderStatus::Cancelled, conn).await?;
    payments::update_payment_status(id, PaymentStatus::Failed, conn).await?;
    orders::fetch_full_order(id, conn).await?.ok_or_else(|| MarketError::order_not_found(id))
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn reserve_stock(&self, product_id: &ProductId, quantity: i64) -> Result<Reservation, MarketError> {
        let mut tx = self.pool.begin().await?;
        let reservation = products::reserve(product_id, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(reservation)
    }

    async fn restore_stock(&self, product_id: &ProductId, quantity: i64) -> Result<i64, MarketError> {
        let mut tx = self.pool.begin().await?;
        let stock = products::restore(product_id, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(stock)
    }

    async fn place_order(&self, order: NewOrder) -> Result<FullOrder, MarketError> {
        let lines = canonical_cart(order.lines)?;
        let mut tx = self.pool.begin().await?;
        let mut priced = Vec::with_capacity(lines.len());
        for line in lines {
            let reservation = products::reserve(&line.product_id, line.quantity, &mut tx).await?;
            priced.push((line, reservation.unit_price));
        }
        let mut total = Money::default();
        for (line, price) in &priced {
            let line_total = price
                .checked_mul(line.quantity)
                .ok_or_else(|| MarketError::InvalidRequest("Order total is too large".into()))?;
            total += line_total;
        }
        let order_id = OrderId::random();
        let mut header = orders::insert_order(&order_id, order.customer_id, total, &mut tx).await?;
        let mut items = Vec::with_capacity(priced.len());
        for (line, price) in &priced {
            items.push(orders::insert_item(&order_id, &line.product_id, line.quantity, *price, &mut tx).await?);
        }
        let mut payment = payments::insert_payment(&order_id, order.method, total, &mut tx).await?;
        let address = order
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| DEFAULT_SHIPPING_ADDRESS.to_string());
        let shipping = shipping::insert_shipping(&order_id, &address, &mut tx).await?;
        if order.method == PaymentMethod::Cod {
            header = orders::update_order_status(&order_id, OrderStatus::Shipping, &mut tx).await?;
            payment = payments::update_payment_status(&order_id, PaymentStatus::Success, &mut tx).await?;
            debug!("🗃️ COD order {order_id} settled on placement");
        }
        tx.commit().await?;
        info!("🗃️ Order {order_id} for customer #{} saved. Total {total}, {} lines", order.customer_id, items.len());
        Ok(FullOrder { order: header, items, payment, shipping })
    }

    async fn attach_gateway_order(&self, order_id: &OrderId, gateway_order_id: &str) -> Result<Payment, MarketError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::set_gateway_order_id(order_id, gateway_order_id, &mut tx)
            .await?
            .ok_or_else(|| MarketError::order_not_found(order_id))?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} linked to gateway order {gateway_order_id}");
        Ok(payment)
    }

    async fn confirm_gateway_payment(
        &self,
        confirmation: GatewayConfirmation,
    ) -> Result<ConfirmationResult, MarketError> {
        let GatewayConfirmation { gateway_order_id, gateway_payment_id, signature } = confirmation;
        let mut tx = self.pool.begin().await?;
        let payment = payments::lock_payment_by_gateway_id(&gateway_order_id, &mut tx)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Gateway order {gateway_order_id}")))?;
        let order_id = payment.order_id.clone();
        if payment.status == PaymentStatus::Success {
            let backfill = payment.gateway_payment_id.is_none()
                || (payment.gateway_signature.is_none() && signature.is_some());
            if backfill {
                payments::record_gateway_payment(
                    payment.id,
                    &gateway_payment_id,
                    signature.as_deref(),
                    PaymentStatus::Success,
                    &mut tx,
                )
                .await?;
            }
            let full = orders::fetch_full_order(&order_id, &mut tx)
                .await?
                .ok_or_else(|| MarketError::order_not_found(&order_id))?;
            tx.commit().await?;
            debug!("🗃️ Gateway order {gateway_order_id} was already confirmed. Nothing to do.");
            return Ok(ConfirmationResult::AlreadyConfirmed(full));
        }
        orders::lock_for_transition(&order_id, OrderStatus::Confirmed, &mut tx).await?;
        orders::update_order_status(&order_id, OrderStatus::Confirmed, &mut tx).await?;
        payments::record_gateway_payment(
            payment.id,
            &gateway_payment_id,
            signature.as_deref(),
            PaymentStatus::Success,
            &mut tx,
        )
        .await?;
        shipping::ensure_shipping(&order_id, &mut tx).await?;
        let full =
            orders::fetch_full_order(&order_id, &mut tx).await?.ok_or_else(|| MarketError::order_not_found(&order_id))?;
        tx.commit().await?;
        info!("🗃️ Order {order_id} confirmed by gateway payment {gateway_payment_id}");
        Ok(ConfirmationResult::Confirmed(full))
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<FullOrder, MarketError> {
        let mut tx = self.pool.begin().await?;
        let full = cancel_in_tx(order_id, &mut tx).await?;
        tx.commit().await?;
        info!("🗃️ Order {order_id} cancelled. {} lines returned to stock", full.items.len());
        Ok(full)
    }

    async fn advance_fulfillment(&self, order_id: &OrderId, status: OrderStatus) -> Result<FullOrder, MarketError> {
        if !matches!(status, OrderStatus::Shipping | OrderStatus::Shipped | OrderStatus::Delivered) {
            return Err(MarketError::InvalidRequest(format!("{status} is not a fulfilment status")));
        }
        let mut tx = self.pool.begin().await?;
        orders::lock_for_transition(order_id, status, &mut tx).await?;
        orders::update_order_status(order_id, status, &mut tx).await?;
        shipping::ensure_shipping(order_id, &mut tx).await?;
        match status {
            OrderStatus::Shipped => {
                shipping::mark_shipped(order_id, &mut tx).await?;
            },
            OrderStatus::Delivered => {
                shipping::mark_delivered(order_id, &mut tx).await?;
            },
            _ => {},
        }
        let full =
            orders::fetch_full_order(order_id, &mut tx).await?.ok_or_else(|| MarketError::order_not_found(order_id))?;
        tx.commit().await?;
        info!("🗃️ Order {order_id} is now {status}");
        Ok(full)
    }

    async fn expire_unpaid_orders(&self, limit: chrono::Duration) -> Result<ExpiryResult, MarketError> {
        let cutoff = Utc::now() - limit;
        let stale = {
            let mut conn = self.pool.acquire().await?;
            orders::fetch_stale_order_ids(PaymentMethod::Gateway, cutoff, &mut conn).await?
        };
        trace!("🗃️ {} unpaid orders are older than {cutoff}", stale.len());
        let mut result = ExpiryResult::default();
        for id in stale {
            match self.cancel_order(&id).await {
                Ok(full) => result.cancelled.push(full.order),
                // Paid or cancelled since we looked
                Err(MarketError::InvalidTransition { from, .. }) => {
                    debug!("🗃️ Order {id} is {from} and no longer needs to expire");
                },
                Err(e) => return Err(e),
            }
        }
        Ok(result)
    }
}

impl OrderQueries for SqliteDatabase {
    async fn fetch_full_order(&self, order_id: &OrderId) -> Result<Option<FullOrder>, MarketError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_full_order(order_id, &mut conn).await
    }

    async fn fetch_order_by_gateway_id(&self, gateway_order_id: &str) -> Result<Option<FullOrder>, MarketError> {
        let mut conn = self.pool.acquire().await?;
        match payments::fetch_payment_by_gateway_id(gateway_order_id, &mut conn).await? {
            Some(payment) => orders::fetch_full_order(&payment.order_id, &mut conn).await,
            None => Ok(None),
        }
    }

    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, MarketError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_customer(customer_id, &mut conn).await?)
    }

    async fn fetch_orders_for_vendor(&self, vendor_id: i64) -> Result<Vec<Order>, MarketError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_vendor(vendor_id, &mut conn).await?)
    }

    async fn count_orders_for_vendor(&self, vendor_id: i64) -> Result<i64, MarketError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::count_orders_for_vendor(vendor_id, &mut conn).await?)
    }

    async fn order_contains_vendor_products(&self, order_id: &OrderId, vendor_id: i64) -> Result<bool, MarketError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::order_contains_vendor_products(order_id, vendor_id, &mut conn).await?)
    }

    async fn vendor_dashboard(&self, vendor_id: i64) -> Result<VendorDashboard, MarketError> {
        let mut conn = self.pool.acquire().await?;
        let product_count = products::count_products_for_vendor(vendor_id, &mut conn).await?;
        let low_stock = products::fetch_low_stock_for_vendor(vendor_id, LOW_STOCK_THRESHOLD, &mut conn).await?;
        let total_sales = products::total_sales_for_vendor(vendor_id, &mut conn).await?;
        Ok(VendorDashboard { product_count, low_stock, total_sales })
    }
}

impl ProductManagement for SqliteDatabase {
    async fn create_product(&self, vendor_id: i64, product: NewProduct) -> Result<Product, MarketError> {
        let mut tx = self.pool.begin().await?;
        let product = products::insert_product(vendor_id, product, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Product {} ({}) created for vendor #{vendor_id}", product.id, product.name);
        Ok(product)
    }

    async fn update_product(&self, id: &ProductId, update: ProductUpdate) -> Result<Option<Product>, MarketError> {
        let mut tx = self.pool.begin().await?;
        let product = products::update_product(id, update, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool, MarketError> {
        let mut tx = self.pool.begin().await?;
        let deleted = products::delete_product(id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    async fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, MarketError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_product(id, &mut conn).await?)
    }

    async fn fetch_all_products(&self) -> Result<Vec<Product>, MarketError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_all_products(&mut conn).await?)
    }

    async fn fetch_products_for_vendor(&self, vendor_id: i64) -> Result<Vec<Product>, MarketError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_products_for_vendor(vendor_id, &mut conn).await?)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn create_account(
        &self,
        email: &str,
        password_hash: &str,
        kind: ProfileKind,
        name: &str,
        avatar: Option<&str>,
    ) -> Result<(Account, Profile), MarketError> {
        // Write first, so the transaction holds the write lock from its first statement
        let mut tx = self.pool.begin().await?;
        let account = match accounts::insert_account(email, password_hash, false, &mut tx).await {
            Ok(account) => account,
            Err(e) if is_unique_violation(&e) => {
                tx.rollback().await?;
                return Err(self.registration_conflict(email, kind).await?);
            },
            Err(e) => return Err(e.into()),
        };
        let profile = accounts::insert_profile(kind, account.id, name, email, avatar, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ New {kind} account #{} registered", account.id);
        Ok((account, profile))
    }

    async fn create_staff_account(&self, email: &str, password_hash: &str) -> Result<Account, MarketError> {
        let mut tx = self.pool.begin().await?;
        let account =
            accounts::insert_account(email, password_hash, true, &mut tx).await.map_err(map_unique_violation)?;
        tx.commit().await?;
        debug!("🗃️ Staff account #{} created", account.id);
        Ok(account)
    }

    async fn fetch_account_by_email(&self, email: &str) -> Result<Option<Account>, MarketError> {
        let mut conn = self.pool.acquire().await?;
        Ok(accounts::fetch_account_by_email(email, &mut conn).await?)
    }

    async fn fetch_account(&self, account_id: i64) -> Result<Option<Account>, MarketError> {
        let mut conn = self.pool.acquire().await?;
        Ok(accounts::fetch_account(account_id, &mut conn).await?)
    }

    async fn fetch_profile_for_account(
        &self,
        account_id: i64,
        kind: ProfileKind,
    ) -> Result<Option<Profile>, MarketError> {
        let mut conn = self.pool.acquire().await?;
        Ok(accounts::fetch_profile_for_account(account_id, kind, &mut conn).await?)
    }

    async fn fetch_profile(&self, kind: ProfileKind, profile_id: i64) -> Result<Option<Profile>, MarketError> {
        let mut conn = self.pool.acquire().await?;
        Ok(accounts::fetch_profile(kind, profile_id, &mut conn).await?)
    }
}
