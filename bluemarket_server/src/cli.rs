use std::{env, env::VarError};

use bluemarket_engine::{AccountApi, SqliteDatabase};
use log::*;

use crate::{config::ServerConfig, errors::ServerError};

pub enum Command {
    Serve,
    CreateStaff { email: String, password: String },
    Help,
}

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn parse_command_line_args() -> Command {
    let args = env::args().skip(1).collect::<Vec<String>>();
    match args.as_slice() {
        [] => Command::Serve,
        [cmd, email, password] if cmd == "create-staff" => {
            Command::CreateStaff { email: email.clone(), password: password.clone() }
        },
        _ => Command::Help,
    }
}

pub fn display_help() {
    display_readme();
    display_envs();
}

/// Creates a staff account. Staff can cancel any order and move orders through fulfilment.
pub async fn create_staff_account(config: &ServerConfig, email: &str, password: &str) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_options(&config.database_url, 1, config.busy_timeout)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await?;
    let api = AccountApi::new(db);
    let account = api.create_staff_account(email, password).await?;
    info!("👤️ Staff account #{} created", account.id);
    println!("Staff account #{} created for {}", account.id, account.email);
    Ok(())
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "BM_HOST",
        "BM_PORT",
        "BM_DATABASE_URL",
        "BM_DB_MAX_CONNECTIONS",
        "BM_DB_BUSY_TIMEOUT",
        "BM_JWT_EXPIRY_HOURS",
        "BM_UNPAID_ORDER_TIMEOUT",
        "BM_GATEWAY_API_URL",
        "BM_GATEWAY_KEY_ID",
        "BM_GATEWAY_CURRENCY",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
