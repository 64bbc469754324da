// ABOUTME: OAuth 2.0 dynamic client registration (RFC 7591) and credential validation
// ABOUTME: Manages the client registry plus the pre-provisioned static client checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

use super::models::{
    ClientRegistrationRequest, ClientRegistrationResponse, OAuth2Client, OAuth2Error,
};
use crate::config::environment::StaticClientConfig;
use crate::constants::{auth_methods, defaults, grant_types, response_types};
use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::errors::AppResult;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// OAuth 2.0 Client Registration Manager
///
/// Owns the dynamic client registry and the credential checks that the token
/// endpoint relies on. The static client is configuration, not registry
/// state; it is consulted before any registry lookup.
pub struct ClientRegistrationManager {
    database: Arc<Database>,
}

impl ClientRegistrationManager {
    /// Creates a new client registration manager
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Register a new OAuth 2.0 client (RFC 7591)
    ///
    /// # Errors
    /// Returns `invalid_client_metadata` / `invalid_redirect_uri` on
    /// validation failure and `server_error` when persistence fails.
    /// Storage failures propagate; a silently-lost registration would
    /// leave the caller holding unusable credentials.
    pub async fn register_client(
        &self,
        request: ClientRegistrationRequest,
    ) -> Result<ClientRegistrationResponse, OAuth2Error> {
        let redirect_uris = request.redirect_uris.unwrap_or_default();

        let grant_types = request
            .grant_types
            .unwrap_or_else(|| vec![grant_types::AUTHORIZATION_CODE.to_owned()]);

        let response_types = request
            .response_types
            .unwrap_or_else(|| vec![response_types::CODE.to_owned()]);

        let token_endpoint_auth_method = request
            .token_endpoint_auth_method
            .unwrap_or_else(|| auth_methods::CLIENT_SECRET_BASIC.to_owned());

        Self::validate_registration(
            &redirect_uris,
            &grant_types,
            &response_types,
            &token_endpoint_auth_method,
        )?;

        let client_id = Self::generate_client_id();
        let client_secret = if token_endpoint_auth_method == auth_methods::NONE {
            None
        } else {
            Some(Self::generate_client_secret())
        };

        let client = OAuth2Client {
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
            client_name: request.client_name.clone(),
            redirect_uris: redirect_uris.clone(),
            token_endpoint_auth_method: token_endpoint_auth_method.clone(),
            grant_types: grant_types.clone(),
            response_types: response_types.clone(),
            scope: request.scope.clone(),
            created_at: Utc::now(),
        };

        self.database.store_oauth2_client(&client).await.map_err(|e| {
            tracing::error!(error = %e, client_id = %client_id, "Failed to store client registration");
            OAuth2Error::server_error("Failed to store client registration")
        })?;

        tracing::info!(client_id = %client_id, auth_method = %token_endpoint_auth_method, "Registered OAuth client");

        Ok(ClientRegistrationResponse {
            client_id,
            client_secret,
            client_id_issued_at: client.created_at.timestamp(),
            redirect_uris,
            token_endpoint_auth_method,
            grant_types,
            response_types,
            client_name: request.client_name,
            scope: request.scope,
        })
    }

    /// Get a registered client by `client_id`. Absence is a normal outcome.
    ///
    /// # Errors
    /// Returns an error only on storage failure
    pub async fn get_client(&self, client_id: &str) -> AppResult<Option<OAuth2Client>> {
        self.database.get_oauth2_client(client_id).await
    }

    /// Validate client credentials against the static pair or the registry.
    ///
    /// True when `(client_id, client_secret)` matches the configured static
    /// client, or a registered client's stored secret. Comparisons are
    /// constant-time.
    ///
    /// # Errors
    /// Returns an error only on storage failure
    pub async fn validate_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
        static_client: &StaticClientConfig,
    ) -> AppResult<bool> {
        if client_id == static_client.client_id
            && constant_time_str_eq(client_secret, &static_client.client_secret)
        {
            return Ok(true);
        }

        let Some(client) = self.get_client(client_id).await? else {
            return Ok(false);
        };

        Ok(client
            .client_secret
            .as_deref()
            .is_some_and(|stored| constant_time_str_eq(client_secret, stored)))
    }

    /// Whether a `client_id` is the static client or resolves in the registry
    ///
    /// # Errors
    /// Returns an error only on storage failure
    pub async fn is_known_client_id(
        &self,
        client_id: &str,
        static_client_id: &str,
    ) -> AppResult<bool> {
        if client_id == static_client_id {
            return Ok(true);
        }
        Ok(self.get_client(client_id).await?.is_some())
    }

    /// Validate registration metadata
    fn validate_registration(
        redirect_uris: &[String],
        grant_types: &[String],
        response_types: &[String],
        token_endpoint_auth_method: &str,
    ) -> Result<(), OAuth2Error> {
        if !auth_methods::SUPPORTED.contains(&token_endpoint_auth_method) {
            return Err(OAuth2Error::invalid_client_metadata(&format!(
                "Unsupported token_endpoint_auth_method: {token_endpoint_auth_method}"
            )));
        }

        for grant_type in grant_types {
            if grant_type != grant_types::AUTHORIZATION_CODE
                && grant_type != grant_types::REFRESH_TOKEN
            {
                return Err(OAuth2Error::invalid_client_metadata(&format!(
                    "Unsupported grant_type: {grant_type}"
                )));
            }
        }

        for response_type in response_types {
            if response_type != response_types::CODE {
                return Err(OAuth2Error::invalid_client_metadata(&format!(
                    "Unsupported response_type: {response_type}"
                )));
            }
        }

        let wants_authorization_code = grant_types
            .iter()
            .any(|g| g == grant_types::AUTHORIZATION_CODE);
        if wants_authorization_code && redirect_uris.is_empty() {
            return Err(OAuth2Error::invalid_redirect_uri(
                "At least one redirect_uri is required for the authorization_code grant",
            ));
        }

        for uri in redirect_uris {
            if !Self::is_valid_redirect_uri(uri) {
                return Err(OAuth2Error::invalid_redirect_uri(&format!(
                    "Invalid redirect_uri: {uri}"
                )));
            }
        }

        Ok(())
    }

    /// Check if a redirect URI is acceptable for registration
    fn is_valid_redirect_uri(uri: &str) -> bool {
        if uri.trim().is_empty() {
            return false;
        }

        // Fragments are a token-leak risk (RFC 6749 section 3.1.2)
        if uri.contains('#') {
            tracing::warn!("Rejected redirect_uri with fragment: {}", uri);
            return false;
        }

        // Wildcards enable subdomain-bypass registrations
        if uri.contains('*') {
            tracing::warn!("Rejected redirect_uri with wildcard: {}", uri);
            return false;
        }

        let Ok(parsed) = url::Url::parse(uri) else {
            tracing::warn!("Rejected malformed redirect_uri: {}", uri);
            return false;
        };

        let is_loopback =
            parsed.host_str() == Some("localhost") || parsed.host_str() == Some("127.0.0.1");

        match parsed.scheme() {
            "https" => true,
            "http" if is_loopback => true,
            _ => {
                tracing::warn!("Rejected redirect_uri with non-HTTPS scheme: {}", uri);
                false
            }
        }
    }

    /// Generate a client ID: `mcp-client-` + base64url of 16 random bytes
    #[must_use]
    pub fn generate_client_id() -> String {
        let mut bytes = [0u8; 16];
        OsRng.fill_bytes(&mut bytes);
        format!(
            "{}{}",
            defaults::CLIENT_ID_PREFIX,
            URL_SAFE_NO_PAD.encode(bytes)
        )
    }

    /// Generate a client secret: base64url of 32 random bytes
    #[must_use]
    pub fn generate_client_secret() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

/// Constant-time string equality. The length check short-circuits, which
/// leaks only the length of the stored value.
fn constant_time_str_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
