//! # Backend contracts
//!
//! The traits in this module describe what a storage backend has to provide for the marketplace engine to work.
//!
//! * [`MarketplaceDatabase`] is the transactional core: stock reservation, order assembly, gateway confirmation and
//!   every order status transition. Implementations must run each method in a single database transaction whose first
//!   statement locks the row being modified.
//! * [`ProductManagement`] covers the vendor catalogue.
//! * [`AccountManagement`] covers accounts and customer/vendor profiles.
//! * [`OrderQueries`] provides read-only views over orders, used by dashboards and order history.
//!
//! [`PaymentGateway`] is the engine's view of the external payment provider. It is not a database trait, but it lives
//! here because it is the other seam that the order flow is generic over.
mod account_management;
mod data_objects;
mod errors;
mod marketplace_database;
mod order_queries;
mod payment_gateway;
mod product_management;

pub use account_management::AccountManagement;
pub use data_objects::{
    ConfirmationResult,
    ExpiryResult,
    ProfileView,
    Quote,
    Reservation,
    VendorDashboard,
    LOW_STOCK_THRESHOLD,
};
pub use errors::MarketError;
pub use marketplace_database::MarketplaceDatabase;
pub use order_queries::OrderQueries;
pub use payment_gateway::PaymentGateway;
pub use product_management::ProductManagement;
