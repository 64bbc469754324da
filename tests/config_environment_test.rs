// ABOUTME: Configuration loading tests against process environment variables
// ABOUTME: Serialized because the environment is process-global state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

mod common;

use gatehouse_mcp_server::config::environment::ServerConfig;
use gatehouse_mcp_server::database_plugins::{factory::Database, DatabaseProvider};
use serial_test::serial;
use std::env;

const MANAGED_VARS: &[&str] = &[
    "HTTP_PORT",
    "LOG_LEVEL",
    "DATABASE_URL",
    "AUTO_MIGRATE",
    "GATE_PASSWORD",
    "GATE_PASSWORD_HASH",
    "API_KEY",
    "SESSION_TTL_HOURS",
    "STATIC_CLIENT_ID",
    "STATIC_CLIENT_SECRET",
    "ALLOWED_REDIRECT_PREFIXES",
    "ISSUER_URL",
    "DEFAULT_SCOPES",
    "OAUTH2_CLIENT_ID_FROM_CODE_FALLBACK",
    "RATE_LIMIT_ENABLED",
    "RATE_LIMIT_REQUESTS",
    "RATE_LIMIT_WINDOW",
];

fn clear_environment() {
    for var in MANAGED_VARS {
        env::remove_var(var);
    }
}

fn set_required_vars() {
    env::set_var("GATE_PASSWORD_HASH", "$2b$04$abcdefghijklmnopqrstuv");
    env::set_var("API_KEY", "env-api-key");
    env::set_var("STATIC_CLIENT_ID", "env-static-client");
    env::set_var("STATIC_CLIENT_SECRET", "env-static-secret");
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_environment();
    set_required_vars();

    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.http_port, 8080);
    assert_eq!(config.gate.api_key, "env-api-key");
    assert_eq!(config.static_client.client_id, "env-static-client");
    assert_eq!(
        config.static_client.allowed_redirect_prefixes,
        vec!["https://claude.ai/", "http://localhost:"]
    );
    assert_eq!(config.oauth2_server.issuer_url, "http://localhost:8080");
    assert!(config.oauth2_server.client_id_from_code_fallback);
    assert!(config.rate_limit.enabled);

    clear_environment();
}

#[test]
#[serial]
fn test_from_env_requires_api_key() {
    clear_environment();
    env::set_var("GATE_PASSWORD_HASH", "$2b$04$abcdefghijklmnopqrstuv");
    env::set_var("STATIC_CLIENT_ID", "env-static-client");
    env::set_var("STATIC_CLIENT_SECRET", "env-static-secret");

    let result = ServerConfig::from_env();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("API_KEY"));

    clear_environment();
}

#[test]
#[serial]
fn test_from_env_requires_gate_password() {
    clear_environment();
    env::set_var("API_KEY", "env-api-key");
    env::set_var("STATIC_CLIENT_ID", "env-static-client");
    env::set_var("STATIC_CLIENT_SECRET", "env-static-secret");

    let result = ServerConfig::from_env();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("GATE_PASSWORD"));

    clear_environment();
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_environment();
    set_required_vars();
    env::set_var("HTTP_PORT", "9123");
    env::set_var("ISSUER_URL", "https://gate.example.com");
    env::set_var("ALLOWED_REDIRECT_PREFIXES", "https://app.example.com/");
    env::set_var("DEFAULT_SCOPES", "read,write");
    env::set_var("OAUTH2_CLIENT_ID_FROM_CODE_FALLBACK", "false");
    env::set_var("RATE_LIMIT_ENABLED", "false");

    let config = ServerConfig::from_env().unwrap();

    assert_eq!(config.http_port, 9123);
    assert_eq!(config.oauth2_server.issuer_url, "https://gate.example.com");
    assert_eq!(
        config.static_client.allowed_redirect_prefixes,
        vec!["https://app.example.com/"]
    );
    assert_eq!(config.default_scope_value(), "read write");
    assert!(!config.oauth2_server.client_id_from_code_fallback);
    assert!(!config.rate_limit.enabled);

    clear_environment();
}

#[test]
#[serial]
fn test_summary_omits_secrets() {
    clear_environment();
    set_required_vars();

    let config = ServerConfig::from_env().unwrap();
    let summary = config.summary();

    assert!(summary.contains("8080"));
    assert!(!summary.contains("env-api-key"));
    assert!(!summary.contains("env-static-secret"));

    clear_environment();
}

/// File-backed databases are created on demand
#[tokio::test]
async fn test_file_backed_database_is_created() {
    common::init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gatehouse.db");
    let url = format!("sqlite:{}", path.display());

    let database = Database::new(&url).await.unwrap();
    database.migrate().await.unwrap();

    assert!(path.exists());
    assert_eq!(database.backend_info(), "SQLite (embedded)");
}
