use bm_common::{Secret, DEFAULT_CURRENCY_CODE};
use log::*;

const DEFAULT_GATEWAY_API_URL: &str = "https://api.razorpay.com/v1";

#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Base URL of the gateway REST API, without a trailing slash.
    pub api_url: String,
    /// The public key id. It is also handed to the paying client so that it can open the checkout widget.
    pub key_id: String,
    /// Used for basic auth against the API, and as the HMAC key for client payment signatures.
    pub key_secret: Secret<String>,
    /// HMAC key for webhook signatures. This is configured separately from the key secret on the gateway dashboard.
    pub webhook_secret: Secret<String>,
    pub currency: String,
}

impl GatewayConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("BM_GATEWAY_API_URL").unwrap_or_else(|_| {
            info!("BM_GATEWAY_API_URL not set, using {DEFAULT_GATEWAY_API_URL}");
            DEFAULT_GATEWAY_API_URL.to_string()
        });
        let key_id = std::env::var("BM_GATEWAY_KEY_ID").unwrap_or_else(|_| {
            warn!("BM_GATEWAY_KEY_ID not set, using (probably useless) default");
            "rzp_test_00000000000000".to_string()
        });
        let key_secret = Secret::new(std::env::var("BM_GATEWAY_KEY_SECRET").unwrap_or_else(|_| {
            warn!("BM_GATEWAY_KEY_SECRET not set, using (probably useless) default");
            "00000000000000".to_string()
        }));
        let webhook_secret = Secret::new(std::env::var("BM_GATEWAY_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("BM_GATEWAY_WEBHOOK_SECRET not set. Webhook signatures will not validate.");
            String::default()
        }));
        let currency = std::env::var("BM_GATEWAY_CURRENCY").unwrap_or_else(|_| DEFAULT_CURRENCY_CODE.to_string());
        Self { api_url: api_url.trim_end_matches('/').to_string(), key_id, key_secret, webhook_secret, currency }
    }
}
