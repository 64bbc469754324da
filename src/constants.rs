// ABOUTME: OAuth protocol constants and configuration defaults
// ABOUTME: Centralizes grant types, auth methods, and error code strings to eliminate hardcoded literals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

//! Protocol constants shared across the authorization server

/// OAuth grant type identifiers
pub mod grant_types {
    /// Authorization code grant (RFC 6749 section 4.1)
    pub const AUTHORIZATION_CODE: &str = "authorization_code";
    /// Refresh token grant. Accepted in registration metadata only;
    /// the token endpoint does not implement it
    pub const REFRESH_TOKEN: &str = "refresh_token";
}

/// OAuth response type identifiers
pub mod response_types {
    /// Authorization code response type
    pub const CODE: &str = "code";
}

/// Token endpoint authentication methods (RFC 7591)
pub mod auth_methods {
    /// Secret sent in the request body
    pub const CLIENT_SECRET_POST: &str = "client_secret_post";
    /// Secret sent via HTTP Basic authentication
    pub const CLIENT_SECRET_BASIC: &str = "client_secret_basic";
    /// Public client, no secret
    pub const NONE: &str = "none";

    /// All methods this server accepts at registration time
    pub const SUPPORTED: &[&str] = &[CLIENT_SECRET_POST, CLIENT_SECRET_BASIC, NONE];
}

/// OAuth error codes (RFC 6749 section 5.2, RFC 7591 section 3.2.2)
pub mod error_codes {
    /// Malformed or missing request parameters
    pub const INVALID_REQUEST: &str = "invalid_request";
    /// Client authentication failed
    pub const INVALID_CLIENT: &str = "invalid_client";
    /// Client identity is unknown
    pub const UNAUTHORIZED_CLIENT: &str = "unauthorized_client";
    /// Authorization code invalid, expired, or binding mismatch
    pub const INVALID_GRANT: &str = "invalid_grant";
    /// Grant type other than `authorization_code`
    pub const UNSUPPORTED_GRANT_TYPE: &str = "unsupported_grant_type";
    /// Response type other than `code`
    pub const UNSUPPORTED_RESPONSE_TYPE: &str = "unsupported_response_type";
    /// Registration metadata failed validation
    pub const INVALID_CLIENT_METADATA: &str = "invalid_client_metadata";
    /// Registration redirect URIs failed validation
    pub const INVALID_REDIRECT_URI: &str = "invalid_redirect_uri";
    /// Unexpected internal fault
    pub const SERVER_ERROR: &str = "server_error";
}

/// Protocol limits and lifetimes
pub mod limits {
    /// Authorization code lifetime in seconds
    pub const AUTH_CODE_TTL_SECS: i64 = 600;
    /// PKCE code verifier / challenge minimum length (RFC 7636 section 4.1)
    pub const PKCE_MIN_LEN: usize = 43;
    /// PKCE code verifier / challenge maximum length (RFC 7636 section 4.1)
    pub const PKCE_MAX_LEN: usize = 128;
    /// Default browser session lifetime in hours
    pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
    /// Default per-IP rate limit window in requests
    pub const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 60;
    /// Default rate limit window in seconds
    pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;
    /// Interval between expired-row sweeps in seconds
    pub const SWEEP_INTERVAL_SECS: u64 = 300;
}

/// Identifier formats and configuration defaults
pub mod defaults {
    /// Prefix for dynamically registered client identifiers
    pub const CLIENT_ID_PREFIX: &str = "mcp-client-";
    /// Redirect URI prefixes the static client may use, comma separated
    pub const ALLOWED_REDIRECT_PREFIXES: &str = "https://claude.ai/,http://localhost:";
    /// Scopes granted when a code carries none
    pub const DEFAULT_SCOPES: &str = "mcp";
    /// Session cookie name
    pub const SESSION_COOKIE: &str = "gatehouse_session";
    /// Service name for logs
    pub const SERVICE_NAME: &str = "gatehouse-mcp-server";
}
