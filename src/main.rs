mod auth;
mod config;
mod db;
mod editor;
mod page;
mod routes;
mod site;
mod state;
mod store;
mod ws;

use std::net::SocketAddr;
use tokio::net::TcpListener;

use config::{generate_config_template, Config};
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load config with layered precedence: defaults < TOML < env < CLI
    let config = Config::load()?;

    // Handle --generate-config: print template and exit
    if config.generate_config {
        print!("{}", generate_config_template());
        return Ok(());
    }

    // Initialize tracing/logging
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "biolink_server=info".parse().unwrap()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "biolink_server=info".parse().unwrap()),
            )
            .init();
    }

    tracing::info!("biolink-server v{} starting", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite database
    let db = db::init_db(&config.data_dir)?;

    // Seed the default page document on first boot
    store::ensure_page_document(&db).map_err(|e| e.to_string())?;

    // Load or generate JWT signing key (256-bit random, stored in data_dir)
    let jwt_secret = auth::jwt::load_or_generate_jwt_secret(&config.data_dir)?;

    // Check for first-boot setup token
    match auth::setup::maybe_generate_setup_token(&db)? {
        Some(token) => {
            tracing::info!("==========================================================");
            tracing::info!("  FIRST BOOT: No admin account yet.");
            tracing::info!("  Setup token: {}", token);
            tracing::info!("  POST /api/auth/setup with this token, an email and a");
            tracing::info!("  password to create the admin account.");
            tracing::info!("==========================================================");
        }
        None => {
            tracing::info!("Admin account exists, setup complete");
        }
    }

    let state = AppState {
        db,
        jwt_secret,
        connections: ws::new_connection_registry(),
        data_dir: config.data_dir.clone(),
    };

    let app = routes::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
