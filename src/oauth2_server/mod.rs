// ABOUTME: OAuth 2.1 authorization server core
// ABOUTME: PKCE verification, client registry, code store, flow state machines, and HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

/// Authorization code store with atomic redemption
pub mod auth_codes;
/// RFC 7591 dynamic client registration and credential validation
pub mod client_registration;
/// Authorize and token-exchange state machines
pub mod endpoints;
/// OAuth data models and request/response types
pub mod models;
/// PKCE (RFC 7636) format validation and S256 verification
pub mod pkce;
/// Rate limiting for OAuth endpoints
pub mod rate_limiting;
/// HTTP route handlers
pub mod routes;

// Authorization code store
pub use auth_codes::{AuthCodeStore, IssueCodeParams};

// RFC 7591 client registration management
pub use client_registration::ClientRegistrationManager;

// OAuth 2.1 authorization server implementation
pub use endpoints::OAuth2AuthorizationServer;

// OAuth data models and request/response types
pub use models::{
    AuthorizationCode, AuthorizeOutcome, AuthorizeRequest, ClientRegistrationRequest,
    ClientRegistrationResponse, OAuth2Client, OAuth2Error, TokenRequest, TokenResponse,
};

// OAuth endpoint rate limiting
pub use rate_limiting::OAuth2RateLimiter;

// OAuth HTTP route handlers
pub use routes::oauth2_routes;
