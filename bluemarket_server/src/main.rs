use bluemarket_server::{
    cli::{create_staff_account, display_help, parse_command_line_args, Command},
    config::ServerConfig,
    server::run_server,
};
use dotenvy::dotenv;
use log::info;

#[actix_web::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    let command = parse_command_line_args();
    let config = ServerConfig::from_env_or_default();
    let result = match command {
        Command::Help => {
            display_help();
            return;
        },
        Command::CreateStaff { email, password } => create_staff_account(&config, &email, &password).await,
        Command::Serve => {
            info!("🚀️ Starting server on {}:{}", config.host, config.port);
            run_server(config).await.map(|_| println!("Bye!"))
        },
    };
    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
