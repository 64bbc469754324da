// ABOUTME: Authorization code store: issuance, expiry-aware lookup, and single-use consumption
// ABOUTME: Redemption uses an atomic take so two concurrent exchanges cannot both succeed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

use super::models::AuthorizationCode;
use crate::constants::limits;
use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::errors::{AppError, AppResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;

/// Parameters for issuing an authorization code
#[derive(Debug)]
pub struct IssueCodeParams<'a> {
    /// Owning client
    pub client_id: &'a str,
    /// Redirect URI the code is bound to
    pub redirect_uri: &'a str,
    /// PKCE commitment
    pub code_challenge: &'a str,
    /// PKCE method (always S256 once the authorize flow has validated it)
    pub code_challenge_method: &'a str,
    /// Requested scope, carried through to the token response
    pub scope: Option<&'a str>,
}

/// Authorization code store backed by the shared relational database
pub struct AuthCodeStore {
    database: Arc<Database>,
}

impl AuthCodeStore {
    /// Creates a new code store
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Generate a fresh code value: base64url of 32 random bytes
    #[must_use]
    pub fn generate_code() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Create and persist an authorization code expiring in 10 minutes.
    ///
    /// # Errors
    /// Storage failures propagate; a silently-lost code would strand the
    /// client mid-flow.
    pub async fn issue(&self, params: IssueCodeParams<'_>) -> AppResult<String> {
        let code = Self::generate_code();
        let created_at = Utc::now();

        let record = AuthorizationCode {
            code: code.clone(),
            client_id: params.client_id.to_owned(),
            redirect_uri: params.redirect_uri.to_owned(),
            code_challenge: params.code_challenge.to_owned(),
            code_challenge_method: params.code_challenge_method.to_owned(),
            scope: params.scope.map(std::borrow::ToOwned::to_owned),
            created_at,
            expires_at: created_at + Duration::seconds(limits::AUTH_CODE_TTL_SECS),
        };

        self.database.store_auth_code(&record).await.map_err(|e| {
            tracing::error!(error = %e, client_id = %params.client_id, "Failed to persist authorization code");
            AppError::storage("Failed to persist authorization code")
        })?;

        Ok(code)
    }

    /// Fetch a code without consuming it. Returns `None` when the code is
    /// missing or `expires_at <= now`; expiry is evaluated against current
    /// time at read time, never cached.
    ///
    /// # Errors
    /// Returns an error only on storage failure
    pub async fn fetch(&self, code: &str) -> AppResult<Option<AuthorizationCode>> {
        self.database.get_auth_code(code, Utc::now()).await
    }

    /// Atomically delete a code and return it, or `None` when it was
    /// missing, expired, or already taken. This is the redemption primitive:
    /// two concurrent exchanges of the same code cannot both observe it.
    ///
    /// # Errors
    /// Returns an error only on storage failure
    pub async fn take(&self, code: &str) -> AppResult<Option<AuthorizationCode>> {
        self.database.take_auth_code(code, Utc::now()).await
    }

    /// Delete a code. Idempotent (deleting an absent code is not an error)
    /// and best-effort: storage failures are logged, never surfaced, because
    /// a leftover row is caught by the next redemption attempt or the sweep.
    pub async fn consume(&self, code: &str) {
        if let Err(e) = self.database.delete_auth_code(code).await {
            tracing::warn!(error = %e, "Failed to delete authorization code");
        }
    }

    /// Remove expired codes. Hygiene only; expiry is already enforced at
    /// read time.
    ///
    /// # Errors
    /// Returns an error only on storage failure
    pub async fn sweep_expired(&self) -> AppResult<u64> {
        self.database.delete_expired_auth_codes(Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_unique_and_url_safe() {
        let a = AuthCodeStore::generate_code();
        let b = AuthCodeStore::generate_code();
        assert_ne!(a, b);
        // 32 bytes encode to 43 unpadded base64url characters
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
