//! BlueMarket engine
//!
//! The engine holds the core logic of the BlueMarket marketplace: vendors list products, customers place orders, stock
//! is reserved, and payments (cash-on-delivery or an external gateway) and shipping are tracked.
//!
//! The library is divided into these sections:
//! 1. The data types ([`mod@db_types`]) shared by every layer.
//! 2. The backend contracts ([`mod@traits`]). A storage backend implements these. SQLite is the supported backend
//!    ([`SqliteDatabase`]). The payment gateway is also reached through a trait here ([`PaymentGateway`]), so the
//!    engine never depends on a concrete gateway client.
//! 3. The public API ([`OrderFlowApi`], [`AccountApi`], [`ProductApi`]). Callers should use these rather than the
//!    backend directly.
//!
//! The engine also emits events when an order is paid for or annulled. See [`mod@events`].
pub mod db_types;
pub mod events;
pub mod helpers;
mod market_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use market_api::{
    accounts_api::AccountApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    product_api::ProductApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{
    AccountManagement,
    ConfirmationResult,
    MarketError,
    MarketplaceDatabase,
    OrderQueries,
    PaymentGateway,
    ProductManagement,
};
