//! Documentation of the waitlist backend behind the product landing page.
//!
//!
//!
//! # General Infrastructure
//! - Landing page posts email signups and analytics events to this server
//! - Primary persistence is a hosted PostgREST database (`SignUps`, `Analytics` tables)
//! - When the database is not configured, or a call to it fails, the same operation runs
//!   against JSON documents in the local data directory
//! - One process, no shared state with other instances
//!
//!
//!
//! # Signup Abuse
//!
//! **Goal**: Keep a single client from flooding the waitlist without adding accounts or captchas.
//!
//! - Each client address gets a 15 minute sliding window
//! - Successful signups and duplicate submissions count toward the window
//! - A 4th counted attempt inside the window is rejected with 429 before the body is read
//! - Windows live in memory and reset on restart
//!
//!
//!
//! # Notes
//!
//! ## Duplicates
//! Duplicate emails are checked before insert, not enforced by a transaction. Two concurrent
//! requests for the same address can both pass the check. A unique index on the remote table
//! is the only hard guarantee.
//!
//! ## Analytics
//! Analytics is telemetry. A failed insert is logged and the client still sees success, so a
//! broken database never shows up on the landing page.
//!
//!
//!
//! # Setup
//!
//! Run locally with file storage.
//! ```sh
//! RUST_LOG=info cargo run -p waitlist
//! ```
//!
//! Run against the hosted database.
//! ```sh
//! SUPABASE_URL=https://project.supabase.co SUPABASE_ANON_KEY=... cargo run -p waitlist
//! ```
//!
//! Check the hosted database end to end.
//! ```sh
//! cargo run -p tester
//! ```
//!
//!
//!
//! # Configuration
//!
//! | Variable | Default |
//! |---|---|
//! | `RUST_PORT` | `3000` |
//! | `APP_ENV` | `development` |
//! | `DATA_DIR` | `data` |
//! | `REMOTE_TIMEOUT_MS` | `5000` |
//! | `SIGNUP_LIST_ENABLED` | `false` |
//! | `SUPABASE_URL` | unset |
//! | `SUPABASE_ANON_KEY` | unset, or `/run/secrets/SUPABASE_ANON_KEY` |
use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::get,
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod analytics;
pub mod config;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod routes;
pub mod signup;
pub mod state;
pub mod storage;
pub mod utils;

use config::Config;
use routes::{
    analytics_handler, analytics_summary_handler, health_handler, signup_handler,
    signup_list_handler, storage_check_handler,
};
use state::AppState;

pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config)?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/signup", get(signup_list_handler).post(signup_handler))
        .route(
            "/analytics",
            get(analytics_summary_handler).post(analytics_handler),
        )
        .route("/health", get(health_handler))
        .route("/health/storage", get(storage_check_handler))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
