use std::sync::Arc;

use bm_common::Money;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::GatewayConfig,
    data_objects::{NewRemoteOrder, RemoteOrder},
    signature,
    GatewayApiError,
};

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        if config.key_id.is_empty() || config.key_secret.is_empty() {
            return Err(GatewayApiError::Initialization("Gateway key id and secret must be set".into()));
        }
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn key_id(&self) -> &str {
        self.config.key_id.as_str()
    }

    pub fn currency(&self) -> &str {
        self.config.currency.as_str()
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<T, GatewayApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req =
            self.client.request(method, url).basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()));
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(|e| GatewayApiError::RestRequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayApiError::RestResponseError(e.to_string()))?;
            Err(GatewayApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Creates a remote order for `amount`. `receipt` is our own order id, so the two can be reconciled from the
    /// gateway dashboard.
    pub async fn create_order(&self, amount: Money, receipt: &str) -> Result<RemoteOrder, GatewayApiError> {
        if amount.minor_units() <= 0 {
            return Err(GatewayApiError::InvalidCurrencyAmount(amount.to_string()));
        }
        let body = NewRemoteOrder {
            amount: amount.minor_units(),
            currency: self.config.currency.clone(),
            receipt: receipt.to_string(),
            payment_capture: 1,
        };
        debug!("Creating remote order for {amount} {} (receipt {receipt})", self.config.currency);
        let order = self.rest_query::<RemoteOrder, _>(Method::POST, "/orders", Some(body)).await?;
        info!("Created remote order {} for receipt {receipt}", order.id);
        Ok(order)
    }

    pub async fn fetch_order(&self, gateway_order_id: &str) -> Result<RemoteOrder, GatewayApiError> {
        let path = format!("/orders/{gateway_order_id}");
        self.rest_query::<RemoteOrder, ()>(Method::GET, &path, None).await
    }

    pub fn verify_payment_signature(&self, order_id: &str, payment_id: &str, sig: &str) -> bool {
        signature::verify_payment_signature(order_id, payment_id, sig, self.config.key_secret.reveal())
    }

    pub fn verify_webhook_signature(&self, payload: &[u8], sig: &str) -> bool {
        signature::verify_webhook_signature(payload, sig, self.config.webhook_secret.reveal())
    }
}

#[cfg(test)]
mod test {
    use bm_common::Secret;

    use super::*;

    fn config() -> GatewayConfig {
        GatewayConfig {
            api_url: "https://api.example.com/v1".into(),
            key_id: "rzp_test_key".into(),
            key_secret: Secret::from("key_secret"),
            webhook_secret: Secret::from("webhook_secret"),
            currency: "INR".into(),
        }
    }

    #[test]
    fn requires_credentials() {
        let mut cfg = config();
        cfg.key_secret = Secret::default();
        assert!(matches!(GatewayApi::new(cfg), Err(GatewayApiError::Initialization(_))));
    }

    #[test]
    fn urls_and_signatures() {
        let api = GatewayApi::new(config()).unwrap();
        assert_eq!(api.url("/orders"), "https://api.example.com/v1/orders");
        let sig = signature::sign_payment("order_1", "pay_1", "key_secret");
        assert!(api.verify_payment_signature("order_1", "pay_1", &sig));
        let sig = signature::sign_webhook(b"{}", "webhook_secret");
        assert!(api.verify_webhook_signature(b"{}", &sig));
        assert!(!api.verify_webhook_signature(b"{}", &signature::sign_webhook(b"{}", "key_secret")));
    }

    #[tokio::test]
    async fn zero_amount_is_rejected() {
        let api = GatewayApi::new(config()).unwrap();
        let err = api.create_order(Money::from_minor_units(0), "receipt").await.unwrap_err();
        assert!(matches!(err, GatewayApiError::InvalidCurrencyAmount(_)));
    }
}
