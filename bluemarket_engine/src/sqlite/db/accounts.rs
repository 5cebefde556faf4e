use chrono::Utc;
use sqlx::SqliteConnection;

use crate::db_types::{Account, Profile, ProfileKind};

fn profile_table(kind: ProfileKind) -> &'static str {
    match kind {
        ProfileKind::Customer => "customer_profiles",
        ProfileKind::Vendor => "vendor_profiles",
    }
}

pub async fn insert_account(
    email: &str,
    password_hash: &str,
    is_staff: bool,
    conn: &mut SqliteConnection,
) -> Result<Account, sqlx::Error> {
    let account = sqlx::query_as(
        "INSERT INTO accounts (email, password_hash, is_staff, created_at) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(is_staff)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;
    Ok(account)
}

pub async fn fetch_account_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Account>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM accounts WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(account)
}

pub async fn fetch_account(id: i64, conn: &mut SqliteConnection) -> Result<Option<Account>, sqlx::Error> {
    let account = sqlx::query_as("SELECT * FROM accounts WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(account)
}

pub async fn insert_profile(
    kind: ProfileKind,
    account_id: i64,
    name: &str,
    email: &str,
    avatar: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Profile, sqlx::Error> {
    let sql = format!(
        "INSERT INTO {} (account_id, name, email, avatar, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        profile_table(kind)
    );
    let profile = sqlx::query_as(&sql)
        .bind(account_id)
        .bind(name)
        .bind(email)
        .bind(avatar)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;
    Ok(profile)
}

pub async fn fetch_profile_for_account(
    account_id: i64,
    kind: ProfileKind,
    conn: &mut SqliteConnection,
) -> Result<Option<Profile>, sqlx::Error> {
    let sql = format!("SELECT * FROM {} WHERE account_id = $1", profile_table(kind));
    let profile = sqlx::query_as(&sql).bind(account_id).fetch_optional(conn).await?;
    Ok(profile)
}

pub async fn fetch_profile(
    kind: ProfileKind,
    profile_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Profile>, sqlx::Error> {
    let sql = format!("SELECT * FROM {} WHERE id = $1", profile_table(kind));
    let profile = sqlx::query_as(&sql).bind(profile_id).fetch_optional(conn).await?;
    Ok(profile)
}
