use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Money, NewProduct, Product, ProductId, ProductUpdate},
    traits::{MarketError, Reservation},
};

pub async fn insert_product(
    vendor_id: i64,
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<Product, sqlx::Error> {
    let now = Utc::now();
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (id, vendor_id, name, description, price, stock, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(ProductId::random())
    .bind(vendor_id)
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.image)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product(id: &ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_all_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as("SELECT * FROM products ORDER BY created_at DESC").fetch_all(conn).await?;
    Ok(products)
}

pub async fn fetch_products_for_vendor(
    vendor_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as("SELECT * FROM products WHERE vendor_id = $1 ORDER BY created_at DESC")
        .bind(vendor_id)
        .fetch_all(conn)
        .await?;
    Ok(products)
}

pub async fn count_products_for_vendor(vendor_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE vendor_id = $1")
        .bind(vendor_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// The vendor's products with fewer than `threshold` units in stock, lowest stock first.
pub async fn fetch_low_stock_for_vendor(
    vendor_id: i64,
    threshold: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    let products = sqlx::query_as("SELECT * FROM products WHERE vendor_id = $1 AND stock < $2 ORDER BY stock, name")
        .bind(vendor_id)
        .bind(threshold)
        .fetch_all(conn)
        .await?;
    Ok(products)
}

/// Applies the fields that are set in `update`. An empty update just returns the current product.
pub async fn update_product(
    id: &ProductId,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    if update.is_empty() {
        return fetch_product(id, conn).await;
    }
    let mut builder = QueryBuilder::new("UPDATE products SET ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.name {
        set_clause.push("name = ");
        set_clause.push_bind_unseparated(name);
    }
    if let Some(description) = update.description {
        set_clause.push("description = ");
        set_clause.push_bind_unseparated(description);
    }
    if let Some(price) = update.price {
        set_clause.push("price = ");
        set_clause.push_bind_unseparated(price);
    }
    if let Some(stock) = update.stock {
        set_clause.push("stock = ");
        set_clause.push_bind_unseparated(stock);
    }
    if let Some(image) = update.image {
        set_clause.push("image = ");
        set_clause.push_bind_unseparated(image);
    }
    set_clause.push("updated_at = ");
    set_clause.push_bind_unseparated(Utc::now());
    builder.push(" WHERE id = ");
    builder.push_bind(id.as_str());
    builder.push(" RETURNING *");
    trace!("📦️ Executing query: {}", builder.sql());
    let product = builder.build_query_as::<Product>().fetch_optional(conn).await?;
    Ok(product)
}

pub async fn delete_product(id: &ProductId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Takes the write lock and returns the product row. See the [module docs](super) for how this works.
pub async fn lock_product(id: &ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("UPDATE products SET stock = stock WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

/// Locks the product row, checks that `quantity` units are available and decrements the stock.
///
/// This is not atomic on its own. Run it inside a transaction, so that a failure on any later line of an order
/// rolls back the reservations made for the earlier lines.
pub async fn reserve(
    product_id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Reservation, MarketError> {
    if quantity <= 0 {
        return Err(MarketError::InvalidRequest(format!("Quantity must be positive, got {quantity}")));
    }
    let product = lock_product(product_id, conn).await?.ok_or_else(|| MarketError::product_not_found(product_id))?;
    if product.stock < quantity {
        debug!("📦️ Cannot reserve {quantity} of {product_id}. Only {} in stock", product.stock);
        return Err(MarketError::InsufficientStock {
            product_id: product_id.clone(),
            requested: quantity,
            available: product.stock,
        });
    }
    let remaining: i64 = sqlx::query_scalar("UPDATE products SET stock = stock - $1 WHERE id = $2 RETURNING stock")
        .bind(quantity)
        .bind(product_id)
        .fetch_one(conn)
        .await?;
    trace!("📦️ Reserved {quantity} of {product_id} at {}. {remaining} left", product.price);
    Ok(Reservation { unit_price: product.price, remaining })
}

/// Locks the product row and adds `quantity` units back to stock. Returns the new stock level.
pub async fn restore(product_id: &ProductId, quantity: i64, conn: &mut SqliteConnection) -> Result<i64, MarketError> {
    if quantity <= 0 {
        return Err(MarketError::InvalidRequest(format!("Quantity must be positive, got {quantity}")));
    }
    lock_product(product_id, conn).await?.ok_or_else(|| MarketError::product_not_found(product_id))?;
    let stock: i64 = sqlx::query_scalar("UPDATE products SET stock = stock + $1 WHERE id = $2 RETURNING stock")
        .bind(quantity)
        .bind(product_id)
        .fetch_one(conn)
        .await?;
    trace!("📦️ Restored {quantity} of {product_id}. {stock} in stock");
    Ok(stock)
}

/// Σ quantity × captured price over the vendor's order items, excluding cancelled orders.
pub async fn total_sales_for_vendor(vendor_id: i64, conn: &mut SqliteConnection) -> Result<Money, sqlx::Error> {
    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(oi.quantity * oi.price), 0) FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        JOIN orders o ON o.id = oi.order_id
        WHERE p.vendor_id = $1 AND o.status != 'cancelled'
        "#,
    )
    .bind(vendor_id)
    .fetch_one(conn)
    .await?;
    Ok(Money::from_minor_units(total))
}
