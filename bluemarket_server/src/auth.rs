//! Access tokens.
//!
//! A successful login yields an HS256-signed JWT that carries the account id and the [`Role`] the session was opened
//! with. Every authenticated request presents the token in an `Authorization: Bearer <token>` header. The
//! [`crate::middleware::JwtMiddlewareFactory`] validates it and stashes the claims in the request extensions, where
//! handlers pick them up by taking a [`JwtClaims`] argument.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use bluemarket_engine::db_types::Role;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub account_id: i64,
    pub role: Role,
    /// Expiry, in seconds since the Unix epoch
    pub exp: i64,
}

impl JwtClaims {
    pub fn customer_id(&self) -> Result<i64, ServerError> {
        self.role.customer_id().ok_or_else(|| ServerError::InsufficientPermissions("Customers only".into()))
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or(ServerError::from(AuthError::MissingToken));
        ready(claims)
    }
}

/// The coarse role categories that routes are guarded by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    Customer,
    Vendor,
    Staff,
}

impl From<&Role> for RoleKind {
    fn from(role: &Role) -> Self {
        match role {
            Role::Customer(_) => RoleKind::Customer,
            Role::Vendor(_) => RoleKind::Vendor,
            Role::Staff => RoleKind::Staff,
        }
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry: config.token_expiry,
        }
    }

    /// Issue a new access token.
    /// This method DOES NOT check credentials. That must be done prior to calling `issue_token`.
    pub fn issue_token(&self, account_id: i64, role: Role) -> Result<String, AuthError> {
        let exp = (Utc::now() + self.expiry).timestamp();
        let claims = JwtClaims { account_id, role, exp };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        trace!("🔑️ Access token validated for account #{}", data.claims.account_id);
        Ok(data.claims)
    }
}
