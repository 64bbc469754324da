// ABOUTME: OAuth 2.1 authorize and token-exchange state machines
// ABOUTME: Validates requests in protocol order, binds codes via PKCE, and issues the gated credential
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

use super::auth_codes::{AuthCodeStore, IssueCodeParams};
use super::client_registration::ClientRegistrationManager;
use super::models::{AuthorizeOutcome, AuthorizeRequest, OAuth2Error, TokenRequest, TokenResponse};
use super::pkce;
use crate::audit::{events, AuditLogger};
use crate::config::ServerConfig;
use crate::constants::auth_methods;
use crate::database_plugins::factory::Database;
use crate::errors::AppError;
use std::sync::Arc;

/// OAuth 2.1 Authorization Server
///
/// Stateless per-request façade over the client registry, the code store,
/// and the audit log. All durable state lives in the shared database, so any
/// number of these may run concurrently without coordination.
pub struct OAuth2AuthorizationServer {
    client_manager: ClientRegistrationManager,
    code_store: AuthCodeStore,
    audit: AuditLogger,
    config: Arc<ServerConfig>,
}

impl OAuth2AuthorizationServer {
    /// Creates a new authorization server over the given database
    #[must_use]
    pub fn new(database: Arc<Database>, config: Arc<ServerConfig>) -> Self {
        Self {
            client_manager: ClientRegistrationManager::new(database.clone()),
            code_store: AuthCodeStore::new(database.clone()),
            audit: AuditLogger::new(database),
            config,
        }
    }

    /// Handle an authorization request (GET /oauth/authorize)
    ///
    /// Validation order is fixed and short-circuits on the first failure:
    /// client_id → redirect_uri → response_type → code_challenge →
    /// code_challenge_method → challenge format → client known → redirect
    /// allowed. Only a fully valid request may reach the login challenge.
    ///
    /// # Errors
    /// Returns a structured OAuth error for the first failing check
    pub async fn authorize(
        &self,
        request: AuthorizeRequest,
        authenticated: bool,
    ) -> Result<AuthorizeOutcome, OAuth2Error> {
        let client_id = request
            .client_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| OAuth2Error::invalid_request("Missing client_id parameter"))?;

        let redirect_uri = request
            .redirect_uri
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| OAuth2Error::invalid_request("Missing redirect_uri parameter"))?;

        if request.response_type.as_deref() != Some("code") {
            return Err(OAuth2Error::unsupported_response_type());
        }

        let code_challenge = request
            .code_challenge
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                OAuth2Error::invalid_request("Missing code_challenge parameter (PKCE is required)")
            })?;

        if request.code_challenge_method.as_deref() != Some("S256") {
            return Err(OAuth2Error::invalid_request(
                "code_challenge_method must be 'S256'",
            ));
        }

        if !pkce::validate_format(code_challenge) {
            return Err(OAuth2Error::invalid_request(
                "code_challenge must be 43-128 characters over [A-Za-z0-9-._~]",
            ));
        }

        let known = self
            .client_manager
            .is_known_client_id(client_id, &self.config.static_client.client_id)
            .await
            .map_err(|e| Self::storage_failure("client lookup", &e))?;
        if !known {
            return Err(OAuth2Error::unauthorized_client("Unknown client_id"));
        }

        self.validate_redirect_uri(client_id, redirect_uri).await?;

        if !authenticated {
            return Ok(AuthorizeOutcome::LoginRequired);
        }

        // Session is authenticated: auto-approve, no consent re-prompt
        let code = self
            .code_store
            .issue(IssueCodeParams {
                client_id,
                redirect_uri,
                code_challenge,
                code_challenge_method: "S256",
                scope: request.scope.as_deref(),
            })
            .await
            .map_err(|e| Self::storage_failure("code issuance", &e))?;

        tracing::info!(client_id = %client_id, "Issued authorization code");

        Ok(AuthorizeOutcome::Redirect {
            redirect_uri: redirect_uri.to_owned(),
            code,
            state: request.state,
        })
    }

    /// Redirect URI validation branches on client identity: the static
    /// client is checked by configured prefix, dynamic clients by exact
    /// membership in their registered set.
    async fn validate_redirect_uri(
        &self,
        client_id: &str,
        redirect_uri: &str,
    ) -> Result<(), OAuth2Error> {
        let allowed = if client_id == self.config.static_client.client_id {
            self.config
                .static_client
                .allowed_redirect_prefixes
                .iter()
                .any(|prefix| redirect_uri.starts_with(prefix.as_str()))
        } else {
            self.client_manager
                .get_client(client_id)
                .await
                .map_err(|e| Self::storage_failure("client lookup", &e))?
                .is_some_and(|client| client.redirect_uris.iter().any(|uri| uri == redirect_uri))
        };

        if allowed {
            Ok(())
        } else {
            tracing::warn!(client_id = %client_id, redirect_uri = %redirect_uri, "Rejected redirect_uri");
            Err(OAuth2Error::invalid_request("Unauthorized redirect_uri"))
        }
    }

    /// Handle a token request (POST /oauth/token)
    ///
    /// Any failing transition halts the exchange with a structured error;
    /// no partial token is ever issued. A code that fails a binding check
    /// after the atomic take is already burned and cannot be retried with
    /// corrected parameters.
    ///
    /// # Errors
    /// Returns a structured OAuth error for the first failing transition
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        let grant_type = request
            .grant_type
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| OAuth2Error::invalid_request("Missing grant_type parameter"))?;
        if grant_type != "authorization_code" {
            return Err(OAuth2Error::unsupported_grant_type());
        }

        let code = request
            .code
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| OAuth2Error::invalid_request("Missing code parameter"))?;

        let redirect_uri = request
            .redirect_uri
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| OAuth2Error::invalid_request("Missing redirect_uri parameter"))?;

        let code_verifier = request
            .code_verifier
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| OAuth2Error::invalid_request("Missing code_verifier parameter"))?;

        let client_id = self.resolve_client_id(request.client_id.as_deref(), code).await?;

        // Auth-method resolution: a registry record decides; the static
        // client (or an unknown id, which fails credential checks below)
        // defaults to client_secret_post semantics.
        let client_record = self
            .client_manager
            .get_client(&client_id)
            .await
            .map_err(|e| Self::storage_failure("client lookup", &e))?;
        let auth_method = client_record
            .as_ref()
            .map_or(auth_methods::CLIENT_SECRET_POST, |c| {
                c.token_endpoint_auth_method.as_str()
            });

        if auth_method == auth_methods::NONE {
            // Public client: identity only, no secret required
            let known = self
                .client_manager
                .is_known_client_id(&client_id, &self.config.static_client.client_id)
                .await
                .map_err(|e| Self::storage_failure("client lookup", &e))?;
            if !known {
                return Err(OAuth2Error::invalid_client("Client authentication failed"));
            }
        } else {
            let client_secret = request
                .client_secret
                .as_deref()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| OAuth2Error::invalid_client("Missing client_secret"))?;

            let valid = self
                .client_manager
                .validate_credentials(&client_id, client_secret, &self.config.static_client)
                .await
                .map_err(|e| Self::storage_failure("credential validation", &e))?;
            if !valid {
                tracing::warn!(client_id = %client_id, "Client credential validation failed");
                return Err(OAuth2Error::invalid_client("Client authentication failed"));
            }
        }

        if !pkce::validate_format(code_verifier) {
            return Err(OAuth2Error::invalid_request(
                "code_verifier must be 43-128 characters over [A-Za-z0-9-._~]",
            ));
        }

        // Atomic take: consumes the code in the same operation that reads
        // it, so a concurrent redemption of the same code observes nothing.
        let Some(stored) = self
            .code_store
            .take(code)
            .await
            .map_err(|e| Self::storage_failure("code redemption", &e))?
        else {
            return Err(OAuth2Error::invalid_grant(
                "Invalid or expired authorization code",
            ));
        };

        if stored.client_id != client_id {
            tracing::warn!(client_id = %client_id, "Authorization code client_id mismatch, code burned");
            return Err(OAuth2Error::invalid_grant("client_id mismatch"));
        }

        if stored.redirect_uri != redirect_uri {
            tracing::warn!(client_id = %client_id, "Authorization code redirect_uri mismatch, code burned");
            return Err(OAuth2Error::invalid_grant("redirect_uri mismatch"));
        }

        if !pkce::verify(code_verifier, &stored.code_challenge) {
            self.audit
                .record(
                    events::TOKEN_EXCHANGE,
                    false,
                    Some(&client_id),
                    Some("PKCE verification failed"),
                )
                .await;
            return Err(OAuth2Error::invalid_grant("PKCE verification failed"));
        }

        self.audit
            .record(events::TOKEN_EXCHANGE, true, Some(&client_id), None)
            .await;

        tracing::info!(client_id = %client_id, "Token exchange successful");

        let scope = stored
            .scope
            .unwrap_or_else(|| self.config.default_scope_value());

        Ok(TokenResponse {
            access_token: self.config.gate.api_key.clone(),
            token_type: "Bearer".to_owned(),
            scope,
        })
    }

    /// Resolve the effective client_id for a token request.
    ///
    /// When the request omits it and the compatibility fallback is enabled,
    /// the id stored on the authorization code record is adopted without
    /// consuming the code. Non-standard; see `OAuth2ServerConfig`.
    async fn resolve_client_id(
        &self,
        requested: Option<&str>,
        code: &str,
    ) -> Result<String, OAuth2Error> {
        if let Some(client_id) = requested.filter(|v| !v.is_empty()) {
            return Ok(client_id.to_owned());
        }

        if self.config.oauth2_server.client_id_from_code_fallback {
            let record = self
                .code_store
                .fetch(code)
                .await
                .map_err(|e| Self::storage_failure("code lookup", &e))?;
            if let Some(record) = record {
                tracing::debug!(
                    client_id = %record.client_id,
                    "Adopted client_id from authorization code record (compatibility fallback)"
                );
                return Ok(record.client_id);
            }
        }

        Err(OAuth2Error::invalid_request("Missing or invalid client_id"))
    }

    /// Map a storage failure on a critical path to a generic server error
    fn storage_failure(operation: &str, error: &AppError) -> OAuth2Error {
        tracing::error!(error = %error, "Storage failure during {operation}");
        OAuth2Error::server_error("Internal storage failure")
    }
}
