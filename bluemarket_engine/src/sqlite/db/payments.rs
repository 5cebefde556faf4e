use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{Money, OrderId, Payment, PaymentMethod, PaymentStatus};

pub async fn insert_payment(
    order_id: &OrderId,
    method: PaymentMethod,
    amount: Money,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let now = Utc::now();
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (order_id, method, status, amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(method)
    .bind(PaymentStatus::Pending)
    .bind(amount)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(payment)
}

pub async fn fetch_payment_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payment_by_gateway_id(
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("SELECT * FROM payments WHERE gateway_order_id = $1")
        .bind(gateway_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

/// Takes the write lock and returns the payment row for the given gateway order id.
pub async fn lock_payment_by_gateway_id(
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as("UPDATE payments SET status = status WHERE gateway_order_id = $1 RETURNING *")
        .bind(gateway_order_id)
        .fetch_optional(conn)
        .await?;
    Ok(payment)
}

pub async fn set_gateway_order_id(
    order_id: &OrderId,
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("UPDATE payments SET gateway_order_id = $1, updated_at = $2 WHERE order_id = $3 RETURNING *")
            .bind(gateway_order_id)
            .bind(Utc::now())
            .bind(order_id)
            .fetch_optional(conn)
            .await?;
    Ok(payment)
}

pub async fn update_payment_status(
    order_id: &OrderId,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment = sqlx::query_as("UPDATE payments SET status = $1, updated_at = $2 WHERE order_id = $3 RETURNING *")
        .bind(status)
        .bind(Utc::now())
        .bind(order_id)
        .fetch_one(conn)
        .await?;
    Ok(payment)
}

/// Stores the gateway payment reference and signature. Values that are already set are kept.
pub async fn record_gateway_payment(
    payment_id: i64,
    gateway_payment_id: &str,
    signature: Option<&str>,
    status: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Payment, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
        UPDATE payments SET
            status = $1,
            gateway_payment_id = COALESCE(gateway_payment_id, $2),
            gateway_signature = COALESCE(gateway_signature, $3),
            updated_at = $4
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(status)
    .bind(gateway_payment_id)
    .bind(signature)
    .bind(Utc::now())
    .bind(payment_id)
    .fetch_one(conn)
    .await?;
    Ok(payment)
}
