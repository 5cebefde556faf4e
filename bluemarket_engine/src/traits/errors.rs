use thiserror::Error;

use crate::db_types::{OrderStatus, ProductId};

/// Every failure the marketplace engine can report.
///
/// With the exception of [`MarketError::DatabaseError`] and [`MarketError::GatewayError`], returning one of these
/// means that nothing was written.
#[derive(Debug, Clone, Error)]
pub enum MarketError {
    #[error("Insufficient stock for product {product_id}. Requested {requested}, but only {available} available")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    #[error("Cannot move an order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("The payment signature is invalid")]
    SignatureInvalid,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Not allowed: {0}")]
    Unauthorized(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("{0}")]
    RegistrationConflict(String),
    #[error("Payment gateway error: {0}")]
    GatewayError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl MarketError {
    pub fn product_not_found(id: &ProductId) -> Self {
        Self::NotFound(format!("Product {id}"))
    }

    pub fn order_not_found<D: std::fmt::Display>(id: D) -> Self {
        Self::NotFound(format!("Order {id}"))
    }
}

impl From<sqlx::Error> for MarketError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => MarketError::NotFound("The requested record does not exist".into()),
            e => MarketError::DatabaseError(e.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for MarketError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        MarketError::DatabaseError(e.to_string())
    }
}
