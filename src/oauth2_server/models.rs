// ABOUTME: OAuth 2.1 data models for client registration, authorization, and token exchange
// ABOUTME: Implements RFC 7591 and OAuth 2.0 request/response structures plus persistence records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

use crate::constants::error_codes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OAuth 2.0 Client Registration Request (RFC 7591)
#[derive(Debug, Clone, Deserialize)]
pub struct ClientRegistrationRequest {
    /// Redirect URIs for authorization code flow
    pub redirect_uris: Option<Vec<String>>,
    /// Optional client name for display
    pub client_name: Option<String>,
    /// Token endpoint authentication method
    pub token_endpoint_auth_method: Option<String>,
    /// Grant types the client can use
    pub grant_types: Option<Vec<String>>,
    /// Response types the client can use
    pub response_types: Option<Vec<String>>,
    /// Scopes the client can request
    pub scope: Option<String>,
}

/// OAuth 2.0 Client Registration Response (RFC 7591)
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientRegistrationResponse {
    /// Unique client identifier
    pub client_id: String,
    /// Client secret, absent for public clients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// When the client identifier was issued (Unix seconds)
    pub client_id_issued_at: i64,
    /// Redirect URIs registered for this client
    pub redirect_uris: Vec<String>,
    /// Token endpoint authentication method
    pub token_endpoint_auth_method: String,
    /// Grant types allowed for this client
    pub grant_types: Vec<String>,
    /// Response types allowed for this client
    pub response_types: Vec<String>,
    /// Client name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    /// Scopes this client can request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// OAuth 2.0 Authorization Request
///
/// Every field is optional at the wire level; the authorize flow performs
/// ordered presence checks so each missing parameter yields its own error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizeRequest {
    /// Client identifier
    pub client_id: Option<String>,
    /// Redirect URI for response
    pub redirect_uri: Option<String>,
    /// Response type (only `code` is supported)
    pub response_type: Option<String>,
    /// PKCE code challenge (RFC 7636)
    pub code_challenge: Option<String>,
    /// PKCE code challenge method (only `S256` is supported)
    pub code_challenge_method: Option<String>,
    /// Requested scopes
    pub scope: Option<String>,
    /// State parameter, opaque to the server and echoed unmodified
    pub state: Option<String>,
}

/// Outcome of a validated authorization request
#[derive(Debug)]
pub enum AuthorizeOutcome {
    /// Redirect the user agent back to the client with a fresh code
    Redirect {
        /// The validated redirect URI
        redirect_uri: String,
        /// The issued authorization code
        code: String,
        /// State to echo byte-for-byte, if supplied
        state: Option<String>,
    },
    /// Request is valid but the session is not authenticated; present the
    /// login challenge so the request can be replayed after credential entry
    LoginRequired,
}

/// OAuth 2.0 Token Request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// Grant type (only `authorization_code` is supported)
    pub grant_type: Option<String>,
    /// Authorization code being redeemed
    pub code: Option<String>,
    /// Redirect URI, must match the one supplied at authorize time
    pub redirect_uri: Option<String>,
    /// PKCE code verifier (RFC 7636)
    pub code_verifier: Option<String>,
    /// Client ID; may be omitted when the compatibility fallback is enabled
    pub client_id: Option<String>,
    /// Client secret for confidential clients
    pub client_secret: Option<String>,
}

/// OAuth 2.0 Token Response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token (the configured static API key)
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Scopes granted
    pub scope: String,
}

/// OAuth 2.0 Error Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Error {
    /// Error code
    pub error: String,
    /// Human-readable error description
    pub error_description: String,
}

impl OAuth2Error {
    fn new(error: &str, description: &str) -> Self {
        Self {
            error: error.to_owned(),
            error_description: description.to_owned(),
        }
    }

    /// Create an `invalid_request` error
    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self::new(error_codes::INVALID_REQUEST, description)
    }

    /// Create an `invalid_client` error
    #[must_use]
    pub fn invalid_client(description: &str) -> Self {
        Self::new(error_codes::INVALID_CLIENT, description)
    }

    /// Create an `unauthorized_client` error
    #[must_use]
    pub fn unauthorized_client(description: &str) -> Self {
        Self::new(error_codes::UNAUTHORIZED_CLIENT, description)
    }

    /// Create an `invalid_grant` error
    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self::new(error_codes::INVALID_GRANT, description)
    }

    /// Create an `unsupported_grant_type` error
    #[must_use]
    pub fn unsupported_grant_type() -> Self {
        Self::new(
            error_codes::UNSUPPORTED_GRANT_TYPE,
            "Only the authorization_code grant type is supported",
        )
    }

    /// Create an `unsupported_response_type` error
    #[must_use]
    pub fn unsupported_response_type() -> Self {
        Self::new(
            error_codes::UNSUPPORTED_RESPONSE_TYPE,
            "Only the code response type is supported",
        )
    }

    /// Create an `invalid_client_metadata` error (RFC 7591)
    #[must_use]
    pub fn invalid_client_metadata(description: &str) -> Self {
        Self::new(error_codes::INVALID_CLIENT_METADATA, description)
    }

    /// Create an `invalid_redirect_uri` error (RFC 7591)
    #[must_use]
    pub fn invalid_redirect_uri(description: &str) -> Self {
        Self::new(error_codes::INVALID_REDIRECT_URI, description)
    }

    /// Create a `server_error` error
    #[must_use]
    pub fn server_error(description: &str) -> Self {
        Self::new(error_codes::SERVER_ERROR, description)
    }

    /// Whether this error maps to HTTP 500 rather than 400
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.error == error_codes::SERVER_ERROR
    }
}

/// A registered OAuth client. Immutable after creation; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Client {
    /// Unique client identifier (`mcp-client-<22 base64url chars>`)
    pub client_id: String,
    /// Client secret, absent when the auth method is `none`
    pub client_secret: Option<String>,
    /// Display name
    pub client_name: Option<String>,
    /// Registered redirect URIs (exact-match set)
    pub redirect_uris: Vec<String>,
    /// Token endpoint authentication method
    pub token_endpoint_auth_method: String,
    /// Allowed grant types
    pub grant_types: Vec<String>,
    /// Allowed response types
    pub response_types: Vec<String>,
    /// Registered scope
    pub scope: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// An ephemeral authorization code. Single-use: redemption is destructive.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    /// The code value (base64url of 32 random bytes)
    pub code: String,
    /// Owning client
    pub client_id: String,
    /// Redirect URI bound at issuance, re-checked at redemption
    pub redirect_uri: String,
    /// PKCE commitment
    pub code_challenge: String,
    /// PKCE method, fixed to S256
    pub code_challenge_method: String,
    /// Scope carried through to the token response
    pub scope: Option<String>,
    /// When this code was created
    pub created_at: DateTime<Utc>,
    /// When this code expires (creation + 10 minutes)
    pub expires_at: DateTime<Utc>,
}

/// A browser session. The core only reads the `authenticated` flag.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session identifier stored in the cookie
    pub id: String,
    /// Whether the shared password was presented successfully
    pub authenticated: bool,
    /// When this session was created
    pub created_at: DateTime<Utc>,
    /// When this session expires
    pub expires_at: DateTime<Utc>,
}

/// A security audit event. Insert failures never fail the caller.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event identifier
    pub id: String,
    /// Event kind, e.g. `token_exchange`
    pub event_kind: String,
    /// Whether the audited operation succeeded
    pub success: bool,
    /// Client involved, when known
    pub client_id: Option<String>,
    /// Failure detail, when applicable
    pub error_message: Option<String>,
    /// When the event occurred
    pub created_at: DateTime<Utc>,
}
