// ABOUTME: SQLite implementation of the DatabaseProvider trait using sqlx
// ABOUTME: Point queries only; code redemption is a single DELETE RETURNING for atomicity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

use super::DatabaseProvider;
use crate::errors::{AppError, AppResult};
use crate::oauth2_server::models::{AuditEvent, AuthorizationCode, OAuth2Client, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::debug;

/// `SQLite` database provider
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Access the underlying connection pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn row_to_client(row: &SqliteRow) -> AppResult<OAuth2Client> {
        Ok(OAuth2Client {
            client_id: row.try_get("client_id")?,
            client_secret: row.try_get("client_secret")?,
            client_name: row.try_get("client_name")?,
            redirect_uris: json_column(row.try_get("redirect_uris")?)?,
            token_endpoint_auth_method: row.try_get("token_endpoint_auth_method")?,
            grant_types: json_column(row.try_get("grant_types")?)?,
            response_types: json_column(row.try_get("response_types")?)?,
            scope: row.try_get("scope")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_auth_code(row: &SqliteRow) -> AppResult<AuthorizationCode> {
        Ok(AuthorizationCode {
            code: row.try_get("code")?,
            client_id: row.try_get("client_id")?,
            redirect_uri: row.try_get("redirect_uri")?,
            code_challenge: row.try_get("code_challenge")?,
            code_challenge_method: row.try_get("code_challenge_method")?,
            scope: row.try_get("scope")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }

    fn row_to_session(row: &SqliteRow) -> AppResult<Session> {
        Ok(Session {
            id: row.try_get("id")?,
            authenticated: row.try_get("authenticated")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }
}

/// Decode a JSON-encoded string-list column
fn json_column(raw: String) -> AppResult<Vec<String>> {
    serde_json::from_str(&raw)
        .map_err(|e| AppError::database(format!("corrupt JSON list column: {e}")))
}

#[async_trait]
impl DatabaseProvider for SqliteDatabase {
    async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("invalid DATABASE_URL: {e}")))?
            .create_if_missing(true);

        // An in-memory database exists per connection, so the pool must hold
        // exactly one connection and never recycle it.
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        Ok(Self { pool })
    }

    async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS oauth2_clients (
                client_id TEXT PRIMARY KEY,
                client_secret TEXT,
                client_name TEXT,
                redirect_uris TEXT NOT NULL,
                token_endpoint_auth_method TEXT NOT NULL,
                grant_types TEXT NOT NULL,
                response_types TEXT NOT NULL,
                scope TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS oauth2_auth_codes (
                code TEXT PRIMARY KEY,
                client_id TEXT NOT NULL,
                redirect_uri TEXT NOT NULL,
                code_challenge TEXT NOT NULL,
                code_challenge_method TEXT NOT NULL,
                scope TEXT,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                authenticated INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS audit_events (
                id TEXT PRIMARY KEY,
                event_kind TEXT NOT NULL,
                success INTEGER NOT NULL,
                client_id TEXT,
                error_message TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("SQLite schema migration complete");
        Ok(())
    }

    async fn store_oauth2_client(&self, client: &OAuth2Client) -> AppResult<()> {
        let query = r#"
            INSERT INTO oauth2_clients (
                client_id, client_secret, client_name, redirect_uris,
                token_endpoint_auth_method, grant_types, response_types,
                scope, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(&client.client_id)
            .bind(&client.client_secret)
            .bind(&client.client_name)
            .bind(serde_json::to_string(&client.redirect_uris).unwrap_or_default())
            .bind(&client.token_endpoint_auth_method)
            .bind(serde_json::to_string(&client.grant_types).unwrap_or_default())
            .bind(serde_json::to_string(&client.response_types).unwrap_or_default())
            .bind(&client.scope)
            .bind(client.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_oauth2_client(&self, client_id: &str) -> AppResult<Option<OAuth2Client>> {
        let query = r#"
            SELECT client_id, client_secret, client_name, redirect_uris,
                   token_endpoint_auth_method, grant_types, response_types,
                   scope, created_at
            FROM oauth2_clients WHERE client_id = ?
        "#;

        let row = sqlx::query(query)
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_client).transpose()
    }

    async fn store_auth_code(&self, code: &AuthorizationCode) -> AppResult<()> {
        let query = r#"
            INSERT INTO oauth2_auth_codes (
                code, client_id, redirect_uri, code_challenge,
                code_challenge_method, scope, created_at, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(&code.code)
            .bind(&code.client_id)
            .bind(&code.redirect_uri)
            .bind(&code.code_challenge)
            .bind(&code.code_challenge_method)
            .bind(&code.scope)
            .bind(code.created_at)
            .bind(code.expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_auth_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AuthorizationCode>> {
        let query = r#"
            SELECT code, client_id, redirect_uri, code_challenge,
                   code_challenge_method, scope, created_at, expires_at
            FROM oauth2_auth_codes WHERE code = ? AND expires_at > ?
        "#;

        let row = sqlx::query(query)
            .bind(code)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_auth_code).transpose()
    }

    async fn take_auth_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AuthorizationCode>> {
        // Single-statement delete-and-return: of two concurrent redemptions
        // of the same code, exactly one sees the row.
        let query = r#"
            DELETE FROM oauth2_auth_codes
            WHERE code = ? AND expires_at > ?
            RETURNING code, client_id, redirect_uri, code_challenge,
                      code_challenge_method, scope, created_at, expires_at
        "#;

        let row = sqlx::query(query)
            .bind(code)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_auth_code).transpose()
    }

    async fn delete_auth_code(&self, code: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM oauth2_auth_codes WHERE code = ?")
            .bind(code)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_expired_auth_codes(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM oauth2_auth_codes WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn create_session(&self, session: &Session) -> AppResult<()> {
        let query = r#"
            INSERT INTO sessions (id, authenticated, created_at, expires_at)
            VALUES (?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(&session.id)
            .bind(session.authenticated)
            .bind(session.created_at)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_session(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        let query = r#"
            SELECT id, authenticated, created_at, expires_at
            FROM sessions WHERE id = ? AND expires_at > ?
        "#;

        let row = sqlx::query(query)
            .bind(session_id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_session).transpose()
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn record_audit_event(&self, event: &AuditEvent) -> AppResult<()> {
        let query = r#"
            INSERT INTO audit_events (
                id, event_kind, success, client_id, error_message, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(&event.id)
            .bind(&event.event_kind)
            .bind(event.success)
            .bind(&event.client_id)
            .bind(&event.error_message)
            .bind(event.created_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
