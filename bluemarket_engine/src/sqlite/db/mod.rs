//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! ## Row locks
//! SQLite has no `SELECT ... FOR UPDATE`. The `lock_*` functions issue a no-op `UPDATE ... RETURNING *` instead. When
//! that is the first statement of a transaction, it takes the database write lock before the row is read, so the
//! values returned cannot change until the transaction commits or rolls back. Concurrent writers wait on the busy
//! timeout in the meantime.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod accounts;
pub mod orders;
pub mod payments;
pub mod products;
pub mod shipping;

const SQLITE_DB_URL: &str = "sqlite://data/bluemarket.db";

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(10);

pub fn db_url() -> String {
    let result = env::var("BM_DATABASE_URL").unwrap_or_else(|_| {
        info!("BM_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32, busy_timeout: Duration) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(busy_timeout)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
