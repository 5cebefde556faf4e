//! # BlueMarket server
//! This crate hosts the HTTP front end of the BlueMarket marketplace. It is responsible for:
//! * Registering customers and vendors, and issuing access tokens at login.
//! * Exposing the product catalogue, and letting vendors manage their own products.
//! * Taking orders, and confirming gateway payments from both the paying client and the gateway's webhooks.
//! * Expiring gateway orders that are never paid for.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! Public routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /register`, `POST /login`
//! * `GET /products`, `GET /products/{id}`
//! * `POST /webhook/gateway`: Payment notifications from the gateway. Authenticated by the body signature.
//!
//! Everything under `/api` requires a bearer token. See [routes](routes/index.html) for the full list.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
