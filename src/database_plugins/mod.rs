// ABOUTME: Database abstraction layer for the Gatehouse server
// ABOUTME: Plugin architecture exposing the point operations the protocol core needs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

use crate::errors::AppResult;
use crate::oauth2_server::models::{AuditEvent, AuthorizationCode, OAuth2Client, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Database factory and backend selection
pub mod factory;

/// `SQLite` backend
pub mod sqlite;

/// Core database abstraction trait
///
/// Every operation is a single bounded point query, insert, or delete; the
/// backend must guarantee atomic single-row visibility per operation. No
/// in-process locking exists above this trait; correctness under concurrent
/// redemption of the same code rests on `take_auth_code` being atomic.
#[async_trait]
pub trait DatabaseProvider: Send + Sync + Clone {
    /// Create a new database connection
    async fn new(database_url: &str) -> AppResult<Self>
    where
        Self: Sized;

    /// Run database migrations to set up schema
    async fn migrate(&self) -> AppResult<()>;

    // ================================
    // OAuth client registry
    // ================================

    /// Persist a newly registered client
    async fn store_oauth2_client(&self, client: &OAuth2Client) -> AppResult<()>;

    /// Fetch a client by id; absence is a normal outcome
    async fn get_oauth2_client(&self, client_id: &str) -> AppResult<Option<OAuth2Client>>;

    // ================================
    // Authorization codes
    // ================================

    /// Persist a freshly issued authorization code
    async fn store_auth_code(&self, code: &AuthorizationCode) -> AppResult<()>;

    /// Fetch a non-expired code by value without consuming it
    async fn get_auth_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AuthorizationCode>>;

    /// Atomically delete a non-expired code and return the deleted row, or
    /// `None` if it was missing, expired, or already taken
    async fn take_auth_code(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AuthorizationCode>>;

    /// Delete a code by value; deleting an absent code is not an error
    async fn delete_auth_code(&self, code: &str) -> AppResult<()>;

    /// Delete all expired codes, returning how many rows went away
    async fn delete_expired_auth_codes(&self, now: DateTime<Utc>) -> AppResult<u64>;

    // ================================
    // Browser sessions
    // ================================

    /// Persist a session
    async fn create_session(&self, session: &Session) -> AppResult<()>;

    /// Fetch a non-expired session by id
    async fn get_session(&self, session_id: &str, now: DateTime<Utc>)
        -> AppResult<Option<Session>>;

    /// Delete all expired sessions, returning how many rows went away
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> AppResult<u64>;

    // ================================
    // Audit log
    // ================================

    /// Insert an audit event
    async fn record_audit_event(&self, event: &AuditEvent) -> AppResult<()>;
}
