// ABOUTME: Session and shared-password gate tests
// ABOUTME: Covers cookie-driven authentication checks and password verification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

mod common;

use common::{create_test_config, create_test_database, TEST_GATE_PASSWORD};
use gatehouse_mcp_server::auth::{verify_gate_password, SessionManager};

#[tokio::test]
async fn test_gate_password_verification() {
    let config = create_test_config();

    assert!(verify_gate_password(TEST_GATE_PASSWORD, &config.gate.password_hash).await);
    assert!(!verify_gate_password("wrong password", &config.gate.password_hash).await);
    assert!(!verify_gate_password("", &config.gate.password_hash).await);
}

#[tokio::test]
async fn test_garbage_hash_never_verifies() {
    assert!(!verify_gate_password("anything", "not-a-bcrypt-hash").await);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let database = create_test_database().await;
    let manager = SessionManager::new(database, 24);

    let session = manager.create_authenticated().await.unwrap();
    assert!(session.authenticated);
    assert_eq!(session.id.len(), 43);

    let cookie = manager.session_cookie(&session);
    assert!(cookie.starts_with(&format!("gatehouse_session={}", session.id)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    // The Set-Cookie value round-trips as a Cookie header
    let header = format!("gatehouse_session={}", session.id);
    assert!(manager.is_authenticated(Some(&header)).await);
}

#[tokio::test]
async fn test_unknown_or_missing_cookie_is_unauthenticated() {
    let database = create_test_database().await;
    let manager = SessionManager::new(database, 24);

    assert!(!manager.is_authenticated(None).await);
    assert!(
        !manager
            .is_authenticated(Some("gatehouse_session=forged-session-id"))
            .await
    );
    assert!(!manager.is_authenticated(Some("other_cookie=value")).await);
}

#[tokio::test]
async fn test_expired_session_is_unauthenticated() {
    let database = create_test_database().await;

    // TTL of zero hours expires immediately
    let manager = SessionManager::new(database, 0);
    let session = manager.create_authenticated().await.unwrap();

    let header = format!("gatehouse_session={}", session.id);
    assert!(!manager.is_authenticated(Some(&header)).await);

    assert_eq!(manager.sweep_expired().await.unwrap(), 1);
}
