use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use super::{payments, shipping};
use crate::{
    db_types::{FullOrder, Money, Order, OrderId, OrderItem, OrderStatus, PaymentMethod, ProductId},
    traits::MarketError,
};

/// Inserts a new order header. Not atomic on its own; the items, payment and shipping rows must be inserted in the
/// same transaction.
pub async fn insert_order(
    id: &OrderId,
    customer_id: i64,
    total: Money,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let now = Utc::now();
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (id, customer_id, total, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(customer_id)
    .bind(total)
    .bind(OrderStatus::Pending)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn insert_item(
    order_id: &OrderId,
    product_id: &ProductId,
    quantity: i64,
    price: Money,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    let item = sqlx::query_as(
        "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price)
    .fetch_one(conn)
    .await?;
    Ok(item)
}

pub async fn fetch_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items =
        sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await?;
    Ok(items)
}

/// Takes the write lock and returns the order row. See the [module docs](super) for how this works.
pub async fn lock_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("UPDATE orders SET status = status WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Sets the order status without checking the transition. Callers must hold the order lock and have validated the
/// move with [`OrderStatus::can_transition_to`].
pub async fn update_order_status(
    id: &OrderId,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *")
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(conn)
        .await?;
    trace!("🧾️ Order {id} is now {status}");
    Ok(order)
}

/// Locks the order and checks that it may move to `status`.
pub async fn lock_for_transition(
    id: &OrderId,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, MarketError> {
    let order = lock_order(id, conn).await?.ok_or_else(|| MarketError::order_not_found(id))?;
    if !order.status.can_transition_to(status) {
        return Err(MarketError::InvalidTransition { from: order.status, to: status });
    }
    Ok(order)
}

pub async fn fetch_full_order(id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<FullOrder>, MarketError> {
    let Some(order) = fetch_order(id, conn).await? else {
        return Ok(None);
    };
    let items = fetch_items(id, conn).await?;
    let payment = payments::fetch_payment_for_order(id, conn)
        .await?
        .ok_or_else(|| MarketError::DatabaseError(format!("Order {id} has no payment record")))?;
    let shipping = shipping::fetch_shipping(id, conn)
        .await?
        .ok_or_else(|| MarketError::DatabaseError(format!("Order {id} has no shipping record")))?;
    Ok(Some(FullOrder { order, items, payment, shipping }))
}

pub async fn fetch_orders_for_customer(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC")
        .bind(customer_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

pub async fn fetch_orders_for_vendor(vendor_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
        SELECT * FROM orders WHERE id IN (
            SELECT oi.order_id FROM order_items oi JOIN products p ON p.id = oi.product_id WHERE p.vendor_id = $1
        )
        ORDER BY created_at DESC
        "#,
    )
    .bind(vendor_id)
    .fetch_all(conn)
    .await?;
    Ok(orders)
}

pub async fn count_orders_for_vendor(vendor_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count = sqlx::query_scalar(
        r#"
        SELECT COUNT(DISTINCT oi.order_id) FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        WHERE p.vendor_id = $1
        "#,
    )
    .bind(vendor_id)
    .fetch_one(conn)
    .await?;
    Ok(count)
}

pub async fn order_contains_vendor_products(
    order_id: &OrderId,
    vendor_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT 1 FROM order_items oi JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = $1 AND p.vendor_id = $2 LIMIT 1
        "#,
    )
    .bind(order_id)
    .bind(vendor_id)
    .fetch_optional(conn)
    .await?;
    Ok(found.is_some())
}

/// Ids of `pending` orders paid with `method` that were created before `cutoff`, oldest first.
pub async fn fetch_stale_order_ids(
    method: PaymentMethod,
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderId>, sqlx::Error> {
    let ids = sqlx::query_scalar(
        r#"
        SELECT o.id FROM orders o JOIN payments p ON p.order_id = o.id
        WHERE o.status = 'pending' AND p.method = $1 AND o.created_at < $2
        ORDER BY o.created_at
        "#,
    )
    .bind(method)
    .bind(cutoff)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}
