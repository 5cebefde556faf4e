//! # Gateway tools
//!
//! A small client for a Razorpay-compatible payment gateway. It covers the calls the marketplace needs:
//! * creating a remote order for the amount the customer has to pay ([`GatewayApi::create_order`]),
//! * verifying the signature the paying client returns after checkout ([`verify_payment_signature`]),
//! * verifying the signature on server-to-server webhook calls ([`verify_webhook_signature`]).
//!
//! Signatures are plain functions so that they can be used (and tested) without a network client.
mod api;
mod config;
mod data_objects;
mod error;
mod signature;

pub use api::GatewayApi;
pub use config::GatewayConfig;
pub use data_objects::{NewRemoteOrder, PaymentEntity, RemoteOrder, WebhookEvent, PAYMENT_CAPTURED, PAYMENT_FAILED};
pub use error::GatewayApiError;
pub use signature::{sign_payment, sign_webhook, verify_payment_signature, verify_webhook_signature};
