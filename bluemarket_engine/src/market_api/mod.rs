//! # Marketplace engine public API
//!
//! The `market_api` module exposes the programmatic API for the marketplace. Each API is a thin struct over a
//! backend that implements the traits it needs, so a caller only pulls in what it uses.
//!
//! * [`order_flow_api`] places orders, confirms gateway payments, cancels orders and drives fulfilment. It is the only
//!   API that talks to the payment gateway, and the only one that emits events.
//! * [`accounts_api`] registers accounts, authenticates logins and builds profile views.
//! * [`product_api`] manages the vendor catalogue, checkout quotes and the vendor dashboard.
//!
//! # API usage
//!
//! ```rust,ignore
//! use bluemarket_engine::{ProductApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements ProductManagement and OrderQueries
//! let api = ProductApi::new(db);
//! let products = api.all_products().await?;
//! ```
pub mod accounts_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod product_api;
