//! Sailor Skills API (sailor-api) - Main entry point
//!
//! Serves the pricing calculator, quotes, booking calendar, inventory and
//! admin billing over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sailor_common::api::{load_token_hash, TokenHash};
use sailor_common::config::{resolve_root_folder, CompiledDefaults, TomlConfig};
use sailor_common::db::init_database;
use sailor_api::integrations::{
    CalendarProvider, DisabledPayments, GoogleCalendarClient, LocalCalendar, PaymentGateway, StripeClient,
};
use sailor_api::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for sailor-api
#[derive(Parser, Debug)]
#[command(name = "sailor-api")]
#[command(about = "Sailor Skills marine services API")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "SAILOR_PORT")]
    port: Option<u16>,

    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<String>,

    /// Path to the TOML config file
    #[arg(short, long, env = "SAILOR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let defaults = CompiledDefaults::for_current_platform();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing; RUST_LOG wins over the config file level
    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("sailor_api={level},sailor_common={level},tower_http=info").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Sailor Skills API (sailor-api) v{}", env!("CARGO_PKG_VERSION"));
    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    std::fs::create_dir_all(&root_folder)
        .with_context(|| format!("Failed to create root folder {}", root_folder.display()))?;

    let db_path = config.database_path(&root_folder);
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path).await.context("Failed to initialize database")?;

    let token_hash = match load_token_hash(&pool).await.context("Failed to load admin token")? {
        TokenHash::Generated { hash, token } => {
            warn!("Generated admin token (shown once, store it now): {}", token);
            hash
        }
        existing if existing.is_disabled() => {
            warn!("Admin authentication disabled (admin_token_hash = 0)");
            existing.hash().to_string()
        }
        existing => existing.hash().to_string(),
    };

    let hours = config.business.to_hours().context("Invalid business hours")?;

    let calendar: Arc<dyn CalendarProvider> = match config.google_calendar() {
        Some(google) => {
            info!(calendar_id = %google.calendar_id, "Using Google Calendar");
            Arc::new(GoogleCalendarClient::new(google).context("Failed to create calendar client")?)
        }
        None => {
            info!("Google Calendar not configured, using bookings table for availability");
            Arc::new(LocalCalendar::new(pool.clone()))
        }
    };

    let payments: Arc<dyn PaymentGateway> = match config.stripe() {
        Some(stripe) => Arc::new(StripeClient::new(&stripe).context("Failed to create Stripe client")?),
        None => {
            warn!("Stripe not configured, admin charges are disabled");
            Arc::new(DisabledPayments)
        }
    };

    let state = AppState::new(pool, token_hash)
        .with_calendar(calendar)
        .with_payments(payments)
        .with_hours(hours)
        .with_admin_emails(config.admin_emails.clone())
        .with_allowed_origins(config.allowed_origins.clone());

    let app = build_router(state);

    let port = args.port.or(config.port).unwrap_or(defaults.port);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("sailor-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
