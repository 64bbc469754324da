// ABOUTME: Server binary for the Gatehouse OAuth authorization gate
// ABOUTME: Loads configuration, initializes storage, and serves the HTTP surface until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

//! # Gatehouse Server Binary
//!
//! Starts the OAuth 2.1 authorization gate with environment-driven
//! configuration, an embedded `SQLite` store, and graceful shutdown.

use anyhow::Result;
use clap::Parser;
use gatehouse_mcp_server::{
    auth::SessionManager,
    config::environment::ServerConfig,
    constants::limits,
    database_plugins::{factory::Database, DatabaseProvider},
    logging,
    oauth2_server::{auth_codes::AuthCodeStore, oauth2_routes, OAuth2RateLimiter},
    routes::HealthRoutes,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "gatehouse-mcp-server")]
#[command(about = "Gatehouse - OAuth 2.1 + PKCE authorization gate for an MCP API resource")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration from environment
    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    let config = Arc::new(config);

    // Initialize production logging
    logging::init_from_env()?;

    info!("Starting Gatehouse MCP Server");
    info!("{}", config.summary());

    // Initialize database
    let database = Arc::new(Database::new(&config.database.url).await?);
    info!("Database initialized: {}", database.backend_info());

    if config.database.auto_migrate {
        database.migrate().await?;
        info!("Database migrations applied");
    }

    // Background hygiene: drop expired codes and sessions. Expiry is
    // enforced at read time, so this only keeps the tables small.
    spawn_expiry_sweeper(database.clone(), config.clone());

    let rate_limiter = Arc::new(OAuth2RateLimiter::from_rate_limit_config(&config.rate_limit));

    let app = oauth2_routes(database, config.clone(), rate_limiter)
        .merge(HealthRoutes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

/// Periodically delete expired authorization codes and sessions
fn spawn_expiry_sweeper(database: Arc<Database>, config: Arc<ServerConfig>) {
    tokio::spawn(async move {
        let code_store = AuthCodeStore::new(database.clone());
        let sessions = SessionManager::new(database, config.gate.session_ttl_hours);
        let mut interval =
            tokio::time::interval(Duration::from_secs(limits::SWEEP_INTERVAL_SECS));

        loop {
            interval.tick().await;

            match code_store.sweep_expired().await {
                Ok(0) => {}
                Ok(n) => info!("Swept {n} expired authorization codes"),
                Err(e) => warn!(error = %e, "Expired code sweep failed"),
            }

            match sessions.sweep_expired().await {
                Ok(0) => {}
                Ok(n) => info!("Swept {n} expired sessions"),
                Err(e) => warn!(error = %e, "Expired session sweep failed"),
            }
        }
    });
}

/// Resolve on ctrl-c so axum can drain in-flight requests
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install ctrl-c handler");
    }
    info!("Shutdown signal received");
}
