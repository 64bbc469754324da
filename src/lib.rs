// ABOUTME: Main library entry point for the Gatehouse authorization gate
// ABOUTME: Provides an OAuth 2.1 authorization-code + PKCE server in front of a single API resource
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

#![deny(unsafe_code)]

//! # Gatehouse MCP Server
//!
//! A single-tenant OAuth 2.1 authorization server that gates access to one
//! API resource behind the authorization-code flow with PKCE (S256). Instead
//! of delegating to a third-party identity provider, the operator configures
//! one shared password; successful login authenticates the browser session
//! and authorization proceeds with auto-approval.
//!
//! ## Features
//!
//! - **Authorization-code flow**: PKCE-bound, single-use, 10-minute codes
//! - **Dynamic client registration**: RFC 7591 metadata endpoint
//! - **Static client**: one pre-provisioned client from configuration,
//!   validated by redirect-URI prefix rather than exact registration
//! - **Discovery**: RFC 8414 / RFC 9728 well-known documents
//!
//! ## Quick Start
//!
//! 1. Configure `GATE_PASSWORD` (or `GATE_PASSWORD_HASH`), `API_KEY`,
//!    `STATIC_CLIENT_ID` and `STATIC_CLIENT_SECRET` in the environment
//! 2. Start the server with `gatehouse-mcp-server`
//! 3. Point an MCP client at `/.well-known/oauth-authorization-server`
//!
//! ## Architecture
//!
//! The server follows a modular architecture:
//! - **`oauth2_server`**: protocol core: PKCE, client registry, code store,
//!   authorize and token state machines, HTTP routes
//! - **`database_plugins`**: storage abstraction with a `SQLite` backend
//! - **`auth`**: shared-password verification and browser sessions
//! - **`audit`**: fire-and-forget security event log
//! - **`config`**: environment-driven configuration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use gatehouse_mcp_server::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let config = ServerConfig::from_env()?;
//!
//!     println!("Gatehouse configured with port: HTTP={}", config.http_port);
//!
//!     Ok(())
//! }
//! ```

/// Fire-and-forget audit event logging
pub mod audit;

/// Shared-password verification and browser session management
pub mod auth;

/// Configuration management
pub mod config;

/// Protocol string constants and default values
pub mod constants;

/// Database abstraction layer with pluggable backends
pub mod database_plugins;

/// Unified error handling system
pub mod errors;

/// Structured logging configuration
pub mod logging;

/// OAuth 2.1 authorization server core
pub mod oauth2_server;

/// `HTTP` routes for service monitoring
pub mod routes;
