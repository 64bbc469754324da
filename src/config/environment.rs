// ABOUTME: Environment-based configuration for the Gatehouse server
// ABOUTME: Loads, validates, and summarizes all deployment settings from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

//! Server configuration loaded from environment variables
//!
//! Every component receives the configuration it needs as an explicit value;
//! there is no global configuration singleton.

use crate::constants::{defaults, limits};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use tracing::{info, warn};

/// Log level setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse from a string, falling back to `Info` on unknown values
    #[must_use]
    pub fn from_str_or_default(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Shared-password gate configuration
    pub gate: GateConfig,
    /// Pre-provisioned static OAuth client
    pub static_client: StaticClientConfig,
    /// Authorization server behavior
    pub oauth2_server: OAuth2ServerConfig,
    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

/// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (SQLite path or `sqlite::memory:`)
    pub url: String,
    /// Run schema migrations on startup
    pub auto_migrate: bool,
}

/// Shared-password gate settings
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// bcrypt hash of the shared operator password
    pub password_hash: String,
    /// Static bearer value returned on every successful token exchange
    pub api_key: String,
    /// Browser session lifetime in hours
    pub session_ttl_hours: i64,
}

/// The single pre-provisioned OAuth client
#[derive(Debug, Clone)]
pub struct StaticClientConfig {
    /// Static client identifier
    pub client_id: String,
    /// Static client secret
    pub client_secret: String,
    /// Redirect URI prefixes the static client may use
    pub allowed_redirect_prefixes: Vec<String>,
}

/// Authorization server behavior settings
#[derive(Debug, Clone)]
pub struct OAuth2ServerConfig {
    /// Issuer URL used in discovery documents
    pub issuer_url: String,
    /// Scopes granted when an authorization code carries none
    pub default_scopes: Vec<String>,
    /// Compatibility accommodation: adopt the client_id stored on the
    /// authorization code when the token request omits it. Non-standard;
    /// disable for strict-conformance deployments.
    pub client_id_from_code_fallback: bool,
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Requests per window
    pub requests_per_window: u32,
    /// Window duration in seconds
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_window: limits::DEFAULT_RATE_LIMIT_REQUESTS,
            window_seconds: limits::DEFAULT_RATE_LIMIT_WINDOW_SECS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required variables are missing or values fail to parse
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let http_port: u16 = env_var_or("HTTP_PORT", "8080")?
            .parse()
            .context("Invalid HTTP_PORT value")?;

        let password_hash = gate_password_hash_from_env()?;

        let config = Self {
            http_port,
            log_level: LogLevel::from_str_or_default(&env_var_or("LOG_LEVEL", "info")?),

            database: DatabaseConfig {
                url: env_var_or("DATABASE_URL", "sqlite:data/gatehouse.db")?,
                auto_migrate: env_var_or("AUTO_MIGRATE", "true")?
                    .parse()
                    .context("Invalid AUTO_MIGRATE value")?,
            },

            gate: GateConfig {
                password_hash,
                api_key: env::var("API_KEY").context("API_KEY must be set")?,
                session_ttl_hours: env_var_or(
                    "SESSION_TTL_HOURS",
                    &limits::DEFAULT_SESSION_TTL_HOURS.to_string(),
                )?
                .parse()
                .context("Invalid SESSION_TTL_HOURS value")?,
            },

            static_client: StaticClientConfig {
                client_id: env::var("STATIC_CLIENT_ID").context("STATIC_CLIENT_ID must be set")?,
                client_secret: env::var("STATIC_CLIENT_SECRET")
                    .context("STATIC_CLIENT_SECRET must be set")?,
                allowed_redirect_prefixes: parse_list(&env_var_or(
                    "ALLOWED_REDIRECT_PREFIXES",
                    defaults::ALLOWED_REDIRECT_PREFIXES,
                )?),
            },

            oauth2_server: OAuth2ServerConfig {
                issuer_url: env_var_or("ISSUER_URL", &format!("http://localhost:{http_port}"))?,
                default_scopes: parse_list(&env_var_or(
                    "DEFAULT_SCOPES",
                    defaults::DEFAULT_SCOPES,
                )?),
                client_id_from_code_fallback: env_var_or(
                    "OAUTH2_CLIENT_ID_FROM_CODE_FALLBACK",
                    "true",
                )?
                .parse()
                .context("Invalid OAUTH2_CLIENT_ID_FROM_CODE_FALLBACK value")?,
            },

            rate_limit: RateLimitConfig {
                enabled: env_var_or("RATE_LIMIT_ENABLED", "true")?
                    .parse()
                    .context("Invalid RATE_LIMIT_ENABLED value")?,
                requests_per_window: env_var_or(
                    "RATE_LIMIT_REQUESTS",
                    &limits::DEFAULT_RATE_LIMIT_REQUESTS.to_string(),
                )?
                .parse()
                .context("Invalid RATE_LIMIT_REQUESTS value")?,
                window_seconds: env_var_or(
                    "RATE_LIMIT_WINDOW",
                    &limits::DEFAULT_RATE_LIMIT_WINDOW_SECS.to_string(),
                )?
                .parse()
                .context("Invalid RATE_LIMIT_WINDOW value")?,
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    /// Returns an error on inconsistent or unusable settings
    pub fn validate(&self) -> Result<()> {
        if self.gate.api_key.is_empty() {
            return Err(anyhow!("API_KEY must not be empty"));
        }

        if self.static_client.client_id.is_empty() || self.static_client.client_secret.is_empty() {
            return Err(anyhow!(
                "STATIC_CLIENT_ID and STATIC_CLIENT_SECRET must not be empty"
            ));
        }

        if self.static_client.allowed_redirect_prefixes.is_empty() {
            return Err(anyhow!("ALLOWED_REDIRECT_PREFIXES must not be empty"));
        }

        if !self.gate.password_hash.starts_with("$2") {
            warn!("GATE_PASSWORD_HASH does not look like a bcrypt hash");
        }

        if self.gate.session_ttl_hours <= 0 {
            return Err(anyhow!("SESSION_TTL_HOURS must be positive"));
        }

        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Gatehouse Configuration:\n\
             - HTTP Port: {}\n\
             - Log Level: {}\n\
             - Database: {}\n\
             - Issuer: {}\n\
             - Static Client: {}\n\
             - Redirect Prefixes: {}\n\
             - client_id-from-code Fallback: {}\n\
             - Rate Limiting: {}",
            self.http_port,
            self.log_level,
            if self.database.url.contains(":memory:") {
                "SQLite (in-memory)"
            } else {
                "SQLite"
            },
            self.oauth2_server.issuer_url,
            self.static_client.client_id,
            self.static_client.allowed_redirect_prefixes.join(", "),
            if self.oauth2_server.client_id_from_code_fallback {
                "Enabled"
            } else {
                "Disabled"
            },
            if self.rate_limit.enabled {
                "Enabled"
            } else {
                "Disabled"
            },
        )
    }

    /// Default scopes joined as a single space-separated value
    #[must_use]
    pub fn default_scope_value(&self) -> String {
        self.oauth2_server.default_scopes.join(" ")
    }
}

/// Resolve the gate password hash: prefer `GATE_PASSWORD_HASH`, otherwise
/// hash `GATE_PASSWORD` at startup
fn gate_password_hash_from_env() -> Result<String> {
    if let Ok(hash) = env::var("GATE_PASSWORD_HASH") {
        return Ok(hash);
    }

    let password =
        env::var("GATE_PASSWORD").context("GATE_PASSWORD or GATE_PASSWORD_HASH must be set")?;
    bcrypt::hash(&password, bcrypt::DEFAULT_COST).context("Failed to hash GATE_PASSWORD")
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
}

/// Parse a comma-separated list
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
