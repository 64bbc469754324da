// ABOUTME: Shared-password verification and browser session management
// ABOUTME: Sessions carry a single authenticated flag, stored in the shared database, keyed by cookie
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

//! The gate: one shared operator password and the sessions it unlocks
//!
//! The authorization flow treats the session as a black-box predicate,
//! "is this user agent authenticated?", checked once per authorize request.

use crate::constants::defaults;
use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::errors::{AppError, AppResult};
use crate::oauth2_server::models::Session;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;

/// Verify a password against the configured bcrypt hash
///
/// Runs on the blocking pool so the bcrypt work factor does not stall the
/// async executor. Any verification error counts as a failed login.
pub async fn verify_gate_password(password: &str, password_hash: &str) -> bool {
    let password = password.to_owned();
    let hash = password_hash.to_owned();

    tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

/// Browser session manager backed by the shared database
pub struct SessionManager {
    database: Arc<Database>,
    session_ttl_hours: i64,
}

impl SessionManager {
    /// Creates a new session manager
    #[must_use]
    pub const fn new(database: Arc<Database>, session_ttl_hours: i64) -> Self {
        Self {
            database,
            session_ttl_hours,
        }
    }

    /// Create an authenticated session and return it.
    ///
    /// Sessions are only ever created after a successful password check, so
    /// the authenticated flag is set at birth.
    ///
    /// # Errors
    /// Returns an error on storage failure
    pub async fn create_authenticated(&self) -> AppResult<Session> {
        let created_at = Utc::now();
        let session = Session {
            id: Self::generate_session_id(),
            authenticated: true,
            created_at,
            expires_at: created_at + Duration::hours(self.session_ttl_hours),
        };

        self.database.create_session(&session).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to persist session");
            AppError::storage("Failed to persist session")
        })?;

        Ok(session)
    }

    /// Whether the cookie header carries a live authenticated session.
    ///
    /// Storage failures are treated as "not authenticated"; the caller
    /// falls back to the login challenge rather than erroring out.
    pub async fn is_authenticated(&self, cookie_header: Option<&str>) -> bool {
        let Some(session_id) = cookie_header.and_then(extract_session_cookie) else {
            return false;
        };

        match self.database.get_session(&session_id, Utc::now()).await {
            Ok(Some(session)) => session.authenticated,
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "Session lookup failed, treating as unauthenticated");
                false
            }
        }
    }

    /// Build the Set-Cookie value for a session.
    ///
    /// HttpOnly blocks script access, SameSite=Lax blocks cross-site POSTs,
    /// Max-Age matches the session row's lifetime.
    #[must_use]
    pub fn session_cookie(&self, session: &Session) -> String {
        format!(
            "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
            defaults::SESSION_COOKIE,
            session.id,
            self.session_ttl_hours * 3600
        )
    }

    /// Remove expired sessions. Hygiene only; expiry is enforced at lookup.
    ///
    /// # Errors
    /// Returns an error on storage failure
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        self.database.delete_expired_sessions(Utc::now()).await
    }

    /// Generate a session identifier: base64url of 32 random bytes
    fn generate_session_id() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

/// Extract the session id from a Cookie header value
fn extract_session_cookie(cookie_header: &str) -> Option<String> {
    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(defaults::SESSION_COOKIE) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value.to_owned());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_session_cookie_among_others() {
        let header = "theme=dark; gatehouse_session=abc123; lang=en";
        assert_eq!(extract_session_cookie(header), Some("abc123".to_owned()));
    }

    #[test]
    fn missing_cookie_yields_none() {
        assert_eq!(extract_session_cookie("theme=dark"), None);
        assert_eq!(extract_session_cookie(""), None);
    }
}
