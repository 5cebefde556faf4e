use std::{env, time::Duration as StdDuration};

use bluemarket_engine::sqlite_db::DEFAULT_BUSY_TIMEOUT;
use bm_common::{helpers::parse_env, Secret};
use chrono::Duration;
use gateway_tools::GatewayConfig;
use log::*;
use rand::random;

use crate::errors::ServerError;

const DEFAULT_BM_HOST: &str = "127.0.0.1";
const DEFAULT_BM_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/bluemarket.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_JWT_EXPIRY_HOURS: i64 = 24;
const MIN_JWT_SECRET_LENGTH: usize = 32;
const DEFAULT_UNPAID_ORDER_TIMEOUT: Duration = Duration::hours(48);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// How long a writer waits for a locked database before giving up.
    pub busy_timeout: StdDuration,
    pub auth: AuthConfig,
    /// Gateway orders that are still unpaid after this long are cancelled and their stock released.
    pub unpaid_order_timeout: Duration,
    pub gateway: GatewayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BM_HOST.to_string(),
            port: DEFAULT_BM_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            auth: AuthConfig::default(),
            unpaid_order_timeout: DEFAULT_UNPAID_ORDER_TIMEOUT,
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BM_HOST").ok().unwrap_or_else(|| DEFAULT_BM_HOST.into());
        let port = env::var("BM_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for BM_PORT. {e} Using the default, {DEFAULT_BM_PORT}, instead.");
                    DEFAULT_BM_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BM_PORT);
        let database_url = env::var("BM_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ BM_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_env::<u32>("BM_DB_MAX_CONNECTIONS").unwrap_or(DEFAULT_MAX_CONNECTIONS);
        let busy_timeout =
            parse_env::<u64>("BM_DB_BUSY_TIMEOUT").map(StdDuration::from_secs).unwrap_or(DEFAULT_BUSY_TIMEOUT);
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let unpaid_order_timeout = configure_unpaid_order_timeout();
        let gateway = GatewayConfig::new_from_env_or_default();
        Self { host, port, database_url, max_connections, busy_timeout, auth, unpaid_order_timeout, gateway }
    }
}

fn configure_unpaid_order_timeout() -> Duration {
    env::var("BM_UNPAID_ORDER_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ BM_UNPAID_ORDER_TIMEOUT is not set. Using the default value of {} hrs.",
                DEFAULT_UNPAID_ORDER_TIMEOUT.num_hours()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::hours)
                .map_err(|e| warn!("🪛️ Invalid configuration value for BM_UNPAID_ORDER_TIMEOUT. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_UNPAID_ORDER_TIMEOUT)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC key used to sign and verify access tokens (HS256).
    pub jwt_secret: Secret<String>,
    /// How long an access token is valid for.
    pub token_expiry: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. Every access token \
             will be invalidated when the server restarts. DO NOT operate a production server like this. 🚨️🚨️🚨️"
        );
        let secret = format!("{:032x}{:032x}", random::<u128>(), random::<u128>());
        Self { jwt_secret: Secret::new(secret), token_expiry: Duration::hours(DEFAULT_JWT_EXPIRY_HOURS) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, token_expiry: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), token_expiry }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("BM_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [BM_JWT_SECRET]")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "BM_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        let hours = parse_env::<i64>("BM_JWT_EXPIRY_HOURS").unwrap_or(DEFAULT_JWT_EXPIRY_HOURS);
        Ok(Self::new(secret, Duration::hours(hours)))
    }
}
