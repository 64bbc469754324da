// ABOUTME: Database factory and provider wrapper with URL-based backend detection
// ABOUTME: Provides a unified Database type that delegates to the selected implementation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

//! Database factory for creating database providers
//!
//! Detects the backend from the connection string. Only `SQLite` is compiled
//! in; the single relational store assumption means one embedded database is
//! sufficient for this deployment shape.

use super::sqlite::SqliteDatabase;
use super::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::oauth2_server::models::{AuditEvent, AuthorizationCode, OAuth2Client, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

/// Database instance wrapper that delegates to the appropriate implementation
#[derive(Clone)]
pub enum Database {
    /// Embedded `SQLite` backend
    SQLite(SqliteDatabase),
}

impl Database {
    /// Get a descriptive string for the current database backend
    #[must_use]
    pub const fn backend_info(&self) -> &'static str {
        match self {
            Self::SQLite(_) => "SQLite (embedded)",
        }
    }
}

#[async_trait]
impl DatabaseProvider for Database {
    async fn new(database_url: &str) -> AppResult<Self> {
        if database_url.starts_with("sqlite:") {
            info!("Creating SQLite database connection");
            Ok(Self::SQLite(SqliteDatabase::new(database_url).await?))
        } else {
            Err(AppError::config(format!(
                "Unsupported database URL scheme (expected sqlite:...): {database_url}"
            )))
        }
    }

    async fn migrate(&self) -> AppResult<()> {
        match self {
            Self::SQLite(db) => db.migrate().await,
        }
    }

    async fn store_oauth2_client(&self, client: &OAuth2Client) -> AppResult<()> {
        match self {
            Self::SQLite(db) => db.store_oauth2_client(client).await,
        }
    }

    async fn get_oauth2_client(&self, client_id: &str) -> AppResult<Option<OAuth2Client>> {
        match self {
            Self::SQLite(db) => db.get_oauth2_client(client_id).await,
        }
    }

    async fn store_auth_code(&self, code: &AuthorizationCode) -> AppResult<()> {
        match self {
            Self::SQLite(db) => db.store_auth_code(code).await,
        }
    }

    async fn get_auth_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AuthorizationCode>> {
        match self {
            Self::SQLite(db) => db.get_auth_code(code, now).await,
        }
    }

    async fn take_auth_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AuthorizationCode>> {
        match self {
            Self::SQLite(db) => db.take_auth_code(code, now).await,
        }
    }

    async fn delete_auth_code(&self, code: &str) -> AppResult<()> {
        match self {
            Self::SQLite(db) => db.delete_auth_code(code).await,
        }
    }

    async fn delete_expired_auth_codes(&self, now: DateTime<Utc>) -> AppResult<u64> {
        match self {
            Self::SQLite(db) => db.delete_expired_auth_codes(now).await,
        }
    }

    async fn create_session(&self, session: &Session) -> AppResult<()> {
        match self {
            Self::SQLite(db) => db.create_session(session).await,
        }
    }

    async fn get_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        match self {
            Self::SQLite(db) => db.get_session(session_id, now).await,
        }
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> AppResult<u64> {
        match self {
            Self::SQLite(db) => db.delete_expired_sessions(now).await,
        }
    }

    async fn record_audit_event(&self, event: &AuditEvent) -> AppResult<()> {
        match self {
            Self::SQLite(db) => db.record_audit_event(event).await,
        }
    }
}
