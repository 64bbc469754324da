// ABOUTME: Authorization code store tests for expiry, atomic take, and idempotent consume
// ABOUTME: Exercises the single-use invariant at the storage layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

mod common;

use chrono::{Duration, Utc};
use common::create_test_database;
use gatehouse_mcp_server::database_plugins::DatabaseProvider;
use gatehouse_mcp_server::oauth2_server::models::AuthorizationCode;
use gatehouse_mcp_server::oauth2_server::{AuthCodeStore, IssueCodeParams};

fn issue_params() -> IssueCodeParams<'static> {
    IssueCodeParams {
        client_id: "mcp-client-test",
        redirect_uri: "http://localhost:9999/cb",
        code_challenge: "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM",
        code_challenge_method: "S256",
        scope: Some("mcp"),
    }
}

#[tokio::test]
async fn test_issue_then_fetch_returns_record() {
    let database = create_test_database().await;
    let store = AuthCodeStore::new(database);

    let code = store.issue(issue_params()).await.unwrap();
    assert_eq!(code.len(), 43);

    let record = store.fetch(&code).await.unwrap().expect("code present");
    assert_eq!(record.client_id, "mcp-client-test");
    assert_eq!(record.redirect_uri, "http://localhost:9999/cb");
    assert_eq!(record.scope.as_deref(), Some("mcp"));
    // 10-minute lifetime
    assert_eq!(record.expires_at, record.created_at + Duration::seconds(600));
}

#[tokio::test]
async fn test_expired_code_is_absent_without_deletion() {
    let database = create_test_database().await;
    let store = AuthCodeStore::new(database.clone());

    // Persist a code whose expiry has already passed
    let created_at = Utc::now() - Duration::seconds(700);
    let record = AuthorizationCode {
        code: AuthCodeStore::generate_code(),
        client_id: "mcp-client-test".to_owned(),
        redirect_uri: "http://localhost:9999/cb".to_owned(),
        code_challenge: "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM".to_owned(),
        code_challenge_method: "S256".to_owned(),
        scope: None,
        created_at,
        expires_at: created_at + Duration::seconds(600),
    };
    database.store_auth_code(&record).await.unwrap();

    assert!(store.fetch(&record.code).await.unwrap().is_none());
    assert!(store.take(&record.code).await.unwrap().is_none());

    // The row is still there for the sweeper to reap
    assert_eq!(store.sweep_expired().await.unwrap(), 1);
    assert_eq!(store.sweep_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn test_take_returns_the_code_exactly_once() {
    let database = create_test_database().await;
    let store = AuthCodeStore::new(database);

    let code = store.issue(issue_params()).await.unwrap();

    let first = store.take(&code).await.unwrap();
    assert!(first.is_some());

    let second = store.take(&code).await.unwrap();
    assert!(second.is_none());

    assert!(store.fetch(&code).await.unwrap().is_none());
}

#[tokio::test]
async fn test_consume_is_idempotent() {
    let database = create_test_database().await;
    let store = AuthCodeStore::new(database);

    let code = store.issue(issue_params()).await.unwrap();

    store.consume(&code).await;
    assert!(store.fetch(&code).await.unwrap().is_none());

    // Deleting an absent code is not an error
    store.consume(&code).await;
    store.consume("never-issued").await;
}

#[tokio::test]
async fn test_codes_are_unique_per_issuance() {
    let database = create_test_database().await;
    let store = AuthCodeStore::new(database);

    let a = store.issue(issue_params()).await.unwrap();
    let b = store.issue(issue_params()).await.unwrap();
    assert_ne!(a, b);

    // Both independently redeemable
    assert!(store.take(&a).await.unwrap().is_some());
    assert!(store.take(&b).await.unwrap().is_some());
}
