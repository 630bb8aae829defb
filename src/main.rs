use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use foodgram::domain::messages::DATA_LOADED;
use foodgram::infrastructure::AppState;
use foodgram::services::user_service;
use foodgram::{config, db, seed, server};

const USAGE: &str = "usage: foodgram [--profile <name>] [load_tags | load_ingredients | create_admin <email> <username> <password>]";

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foodgram=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = config::Config::from_env();

    // Check for --profile CLI argument
    if let Some(pos) = args.iter().position(|arg| arg == "--profile") {
        let Some(profile) = args.get(pos + 1).cloned() else {
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        };
        config = config.with_profile(&profile);
        args.drain(pos..=pos + 1);
    }

    let db = match db::init_db(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let command: Vec<&str> = args.iter().map(String::as_str).collect();
    match command.as_slice() {
        [] => {
            let state = AppState::new(db, &config);
            if let Err(e) = server::serve(state, &config).await {
                tracing::error!("Server error: {}", e);
                return ExitCode::FAILURE;
            }
        }
        ["load_tags"] => match seed::load_tags(&db, &config.data_root).await {
            Ok(_) => println!("{}", DATA_LOADED),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        ["load_ingredients"] => match seed::load_ingredients(&db, &config.data_root).await {
            Ok(_) => println!("{}", DATA_LOADED),
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        ["create_admin", email, username, password] => {
            match user_service::ensure_admin(&db, email, username, password).await {
                Ok(admin) => println!("Admin {} ({}) ready", admin.username, admin.email),
                Err(e) => {
                    eprintln!("{}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
