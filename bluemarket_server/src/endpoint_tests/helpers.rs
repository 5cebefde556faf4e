use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use bluemarket_engine::db_types::Role;
use chrono::Duration;
use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::{auth::TokenIssuer, config::AuthConfig, server::json_config};

// DO NOT re-use this secret anywhere.
const TEST_JWT_SECRET: &str = "endpoint-tests-only-secret-0123456789abcdef";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET, Duration::hours(1))
}

pub fn issuer() -> TokenIssuer {
    TokenIssuer::new(&get_auth_config())
}

pub fn issue_token(account_id: i64, role: Role) -> String {
    issuer().issue_token(account_id, role).expect("Failed to sign token")
}

pub fn get(path: &str, token: &str) -> TestRequest {
    with_token(TestRequest::get().uri(path), token)
}

pub fn post<T: Serialize>(path: &str, token: &str, body: &T) -> TestRequest {
    with_token(TestRequest::post().uri(path).set_json(body), token)
}

pub fn patch<T: Serialize>(path: &str, token: &str, body: &T) -> TestRequest {
    with_token(TestRequest::patch().uri(path).set_json(body), token)
}

pub fn delete(path: &str, token: &str) -> TestRequest {
    with_token(TestRequest::delete().uri(path), token)
}

fn with_token(req: TestRequest, token: &str) -> TestRequest {
    if token.is_empty() {
        req
    } else {
        req.insert_header(("Authorization", format!("Bearer {token}")))
    }
}

/// Sends a request through a fresh app and returns the status and body. Errors raised by middleware are rendered the
/// way the server would render them.
pub async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let _ = env_logger::try_init();
    let app = App::new().app_data(web::Data::new(issuer())).app_data(json_config()).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1,
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
    (status, body)
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}
