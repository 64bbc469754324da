// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides common database and configuration helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project
#![allow(dead_code)]

//! Shared test utilities for `gatehouse_mcp_server`
//!
//! This module provides common test setup functions to reduce duplication
//! across integration tests.

use gatehouse_mcp_server::config::environment::{
    DatabaseConfig, GateConfig, LogLevel, OAuth2ServerConfig, RateLimitConfig, ServerConfig,
    StaticClientConfig,
};
use gatehouse_mcp_server::database_plugins::{factory::Database, DatabaseProvider};
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// Shared password every test config accepts
pub const TEST_GATE_PASSWORD: &str = "correct horse battery staple";

/// API key the test config hands out on successful exchanges
pub const TEST_API_KEY: &str = "test-api-key";

/// Static client credentials in the test config
pub const TEST_STATIC_CLIENT_ID: &str = "gatehouse-static-client";
pub const TEST_STATIC_CLIENT_SECRET: &str = "gatehouse-static-secret";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Standard in-memory test database with migrations applied
pub async fn create_test_database() -> Arc<Database> {
    init_test_logging();
    let database = Database::new("sqlite::memory:")
        .await
        .expect("in-memory database");
    database.migrate().await.expect("migrations");
    Arc::new(database)
}

/// Standard test configuration. The bcrypt cost is the crate minimum so
/// login-path tests stay fast.
pub fn create_test_config() -> Arc<ServerConfig> {
    Arc::new(ServerConfig {
        http_port: 8080,
        log_level: LogLevel::from_str_or_default("warn"),
        database: DatabaseConfig {
            url: "sqlite::memory:".to_owned(),
            auto_migrate: true,
        },
        gate: GateConfig {
            password_hash: bcrypt::hash(TEST_GATE_PASSWORD, 4).expect("bcrypt hash"),
            api_key: TEST_API_KEY.to_owned(),
            session_ttl_hours: 24,
        },
        static_client: StaticClientConfig {
            client_id: TEST_STATIC_CLIENT_ID.to_owned(),
            client_secret: TEST_STATIC_CLIENT_SECRET.to_owned(),
            allowed_redirect_prefixes: vec![
                "https://claude.ai/".to_owned(),
                "http://localhost:".to_owned(),
            ],
        },
        oauth2_server: OAuth2ServerConfig {
            issuer_url: "http://localhost:8080".to_owned(),
            default_scopes: vec!["mcp".to_owned()],
            client_id_from_code_fallback: true,
        },
        rate_limit: RateLimitConfig {
            enabled: false,
            requests_per_window: 60,
            window_seconds: 60,
        },
    })
}
