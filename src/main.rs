//! Attendance gateway entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Connect to Redis
//! 3. Build router with API routes, CORS, tracing, and security headers
//! 4. Start Axum server
//!
//! Also supports `generate-secret` and `hash-password` subcommands for operators.

use attendance_gateway::{
    app, auth::credentials::hash_password, auth::middleware::AppState,
    auth::secret::generate_signing_secret, config::Config, storage::RedisStore,
};
use std::sync::Arc;

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  attendance-gateway                          Run the server");
    eprintln!("  attendance-gateway generate-secret          Print a new JWT_SECRET value");
    eprintln!("  attendance-gateway hash-password <password> Print an Argon2id hash");
    eprintln!();
    eprintln!("A generated secret only takes effect once installed as JWT_SECRET;");
    eprintln!("doing so invalidates every token issued under the old secret.");
}

/// Handle an operator subcommand. Returns `None` when the server should start.
fn run_subcommand(args: &[String]) -> Option<i32> {
    match args.get(1).map(String::as_str) {
        None => None,
        Some("generate-secret") if args.len() == 2 => {
            println!("{}", generate_signing_secret());
            Some(0)
        }
        Some("hash-password") if args.len() == 3 => match hash_password(&args[2]) {
            Ok(hash) => {
                println!("{}", hash);
                Some(0)
            }
            Err(e) => {
                eprintln!("Error hashing password: {}", e);
                Some(1)
            }
        },
        Some(_) => {
            print_usage();
            Some(1)
        }
    }
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if let Some(code) = run_subcommand(&args) {
        std::process::exit(code);
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = Config::from_env().expect("Failed to load config");
    tracing::info!("Starting attendance gateway on {}", config.bind_addr);

    let defaulted = config.defaulted_admin_vars();
    if !defaulted.is_empty() {
        tracing::warn!(
            vars = ?defaulted,
            "Admin fallback credentials use built-in defaults; set them or store credentials"
        );
    }

    // Connect to Redis
    let store = RedisStore::connect(&config.redis_url)
        .await
        .expect("Failed to connect to Redis");

    let bind_addr = config.bind_addr;
    let state = AppState::new(Arc::new(store), config);
    let router = app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, router).await.expect("Server error");
}
