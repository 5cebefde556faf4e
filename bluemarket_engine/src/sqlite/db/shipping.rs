use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{OrderId, Shipping, ShippingStatus, DEFAULT_SHIPPING_ADDRESS};

pub async fn insert_shipping(
    order_id: &OrderId,
    address: &str,
    conn: &mut SqliteConnection,
) -> Result<Shipping, sqlx::Error> {
    let shipping =
        sqlx::query_as("INSERT INTO shipping (order_id, address, status) VALUES ($1, $2, $3) RETURNING *")
            .bind(order_id)
            .bind(address)
            .bind(ShippingStatus::Pending)
            .fetch_one(conn)
            .await?;
    Ok(shipping)
}

pub async fn fetch_shipping(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Shipping>, sqlx::Error> {
    let shipping =
        sqlx::query_as("SELECT * FROM shipping WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(shipping)
}

/// Returns the shipping record for the order, creating one with the placeholder address if it is missing.
pub async fn ensure_shipping(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Shipping, sqlx::Error> {
    sqlx::query("INSERT INTO shipping (order_id, address, status) VALUES ($1, $2, $3) ON CONFLICT (order_id) DO NOTHING")
        .bind(order_id)
        .bind(DEFAULT_SHIPPING_ADDRESS)
        .bind(ShippingStatus::Pending)
        .execute(&mut *conn)
        .await?;
    let shipping = sqlx::query_as("SELECT * FROM shipping WHERE order_id = $1").bind(order_id).fetch_one(conn).await?;
    Ok(shipping)
}

pub async fn mark_shipped(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Shipping, sqlx::Error> {
    let shipping =
        sqlx::query_as("UPDATE shipping SET status = $1, shipped_at = $2 WHERE order_id = $3 RETURNING *")
            .bind(ShippingStatus::Shipped)
            .bind(Utc::now())
            .bind(order_id)
            .fetch_one(conn)
            .await?;
    Ok(shipping)
}

pub async fn mark_delivered(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Shipping, sqlx::Error> {
    let shipping =
        sqlx::query_as("UPDATE shipping SET status = $1, delivered_at = $2 WHERE order_id = $3 RETURNING *")
            .bind(ShippingStatus::Delivered)
            .bind(Utc::now())
            .bind(order_id)
            .fetch_one(conn)
            .await?;
    Ok(shipping)
}
