// ABOUTME: Dynamic client registration tests for RFC 7591 validation and credential checks
// ABOUTME: Covers metadata validation, redirect URI rules, and registry credential verification
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

mod common;

use common::{create_test_config, create_test_database};
use gatehouse_mcp_server::oauth2_server::models::ClientRegistrationRequest;
use gatehouse_mcp_server::oauth2_server::ClientRegistrationManager;

fn minimal_request() -> ClientRegistrationRequest {
    ClientRegistrationRequest {
        redirect_uris: Some(vec!["http://localhost:9999/cb".to_owned()]),
        client_name: Some("Test Client".to_owned()),
        token_endpoint_auth_method: None,
        grant_types: None,
        response_types: None,
        scope: None,
    }
}

#[tokio::test]
async fn test_registration_issues_credentials() {
    let database = create_test_database().await;
    let manager = ClientRegistrationManager::new(database);

    let response = manager.register_client(minimal_request()).await.unwrap();

    assert!(response.client_id.starts_with("mcp-client-"));
    assert_eq!(response.client_id.len(), "mcp-client-".len() + 22);
    // Defaulted auth method is confidential, so a secret is issued
    assert_eq!(response.token_endpoint_auth_method, "client_secret_basic");
    assert_eq!(response.client_secret.as_ref().unwrap().len(), 43);
    assert_eq!(response.grant_types, vec!["authorization_code"]);
    assert_eq!(response.response_types, vec!["code"]);
}

#[tokio::test]
async fn test_registration_public_client_gets_no_secret() {
    let database = create_test_database().await;
    let manager = ClientRegistrationManager::new(database);

    let request = ClientRegistrationRequest {
        token_endpoint_auth_method: Some("none".to_owned()),
        ..minimal_request()
    };

    let response = manager.register_client(request).await.unwrap();
    assert!(response.client_secret.is_none());
    assert_eq!(response.token_endpoint_auth_method, "none");
}

#[tokio::test]
async fn test_registration_rejects_empty_redirect_uris_for_code_grant() {
    let database = create_test_database().await;
    let manager = ClientRegistrationManager::new(database);

    let request = ClientRegistrationRequest {
        redirect_uris: Some(vec![]),
        grant_types: Some(vec!["authorization_code".to_owned()]),
        ..minimal_request()
    };

    let error = manager.register_client(request).await.unwrap_err();
    assert_eq!(error.error, "invalid_redirect_uri");
}

#[tokio::test]
async fn test_registration_rejects_unknown_grant_type() {
    let database = create_test_database().await;
    let manager = ClientRegistrationManager::new(database);

    let request = ClientRegistrationRequest {
        grant_types: Some(vec!["client_credentials".to_owned()]),
        ..minimal_request()
    };

    let error = manager.register_client(request).await.unwrap_err();
    assert_eq!(error.error, "invalid_client_metadata");
}

#[tokio::test]
async fn test_registration_rejects_unknown_response_type() {
    let database = create_test_database().await;
    let manager = ClientRegistrationManager::new(database);

    let request = ClientRegistrationRequest {
        response_types: Some(vec!["token".to_owned()]),
        ..minimal_request()
    };

    let error = manager.register_client(request).await.unwrap_err();
    assert_eq!(error.error, "invalid_client_metadata");
}

#[tokio::test]
async fn test_registration_rejects_unknown_auth_method() {
    let database = create_test_database().await;
    let manager = ClientRegistrationManager::new(database);

    let request = ClientRegistrationRequest {
        token_endpoint_auth_method: Some("private_key_jwt".to_owned()),
        ..minimal_request()
    };

    let error = manager.register_client(request).await.unwrap_err();
    assert_eq!(error.error, "invalid_client_metadata");
}

#[tokio::test]
async fn test_registration_redirect_uri_hygiene() {
    let database = create_test_database().await;
    let manager = ClientRegistrationManager::new(database);

    for bad in [
        "https://example.com/cb#fragment",
        "https://*.example.com/cb",
        "http://example.com/cb",
        "not a url",
    ] {
        let request = ClientRegistrationRequest {
            redirect_uris: Some(vec![bad.to_owned()]),
            ..minimal_request()
        };
        let error = manager.register_client(request).await.unwrap_err();
        assert_eq!(error.error, "invalid_redirect_uri", "uri {bad}");
    }

    // HTTPS anywhere and HTTP loopback are acceptable
    for good in [
        "https://example.com/cb",
        "http://localhost:9999/cb",
        "http://127.0.0.1:3000/cb",
    ] {
        let request = ClientRegistrationRequest {
            redirect_uris: Some(vec![good.to_owned()]),
            ..minimal_request()
        };
        assert!(manager.register_client(request).await.is_ok(), "uri {good}");
    }
}

#[tokio::test]
async fn test_lookup_absent_client_is_not_an_error() {
    let database = create_test_database().await;
    let manager = ClientRegistrationManager::new(database);

    let found = manager.get_client("mcp-client-missing").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_registered_client_roundtrips_through_registry() {
    let database = create_test_database().await;
    let manager = ClientRegistrationManager::new(database);

    let response = manager.register_client(minimal_request()).await.unwrap();
    let stored = manager
        .get_client(&response.client_id)
        .await
        .unwrap()
        .expect("client stored");

    assert_eq!(stored.client_id, response.client_id);
    assert_eq!(stored.redirect_uris, vec!["http://localhost:9999/cb"]);
    assert_eq!(stored.client_secret, response.client_secret);
}

#[tokio::test]
async fn test_validate_credentials_static_and_registered() {
    let database = create_test_database().await;
    let config = create_test_config();
    let manager = ClientRegistrationManager::new(database);

    // Static pair always validates
    assert!(manager
        .validate_credentials(
            common::TEST_STATIC_CLIENT_ID,
            common::TEST_STATIC_CLIENT_SECRET,
            &config.static_client,
        )
        .await
        .unwrap());

    // Wrong static secret fails
    assert!(!manager
        .validate_credentials(
            common::TEST_STATIC_CLIENT_ID,
            "wrong",
            &config.static_client,
        )
        .await
        .unwrap());

    // Registered secret validates; a wrong one does not
    let response = manager.register_client(minimal_request()).await.unwrap();
    let secret = response.client_secret.unwrap();
    assert!(manager
        .validate_credentials(&response.client_id, &secret, &config.static_client)
        .await
        .unwrap());
    assert!(!manager
        .validate_credentials(&response.client_id, "wrong", &config.static_client)
        .await
        .unwrap());

    // Unknown client fails
    assert!(!manager
        .validate_credentials("mcp-client-unknown", &secret, &config.static_client)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_is_known_client_id() {
    let database = create_test_database().await;
    let manager = ClientRegistrationManager::new(database);

    assert!(manager
        .is_known_client_id(common::TEST_STATIC_CLIENT_ID, common::TEST_STATIC_CLIENT_ID)
        .await
        .unwrap());
    assert!(!manager
        .is_known_client_id("mcp-client-unknown", common::TEST_STATIC_CLIENT_ID)
        .await
        .unwrap());

    let response = manager.register_client(minimal_request()).await.unwrap();
    assert!(manager
        .is_known_client_id(&response.client_id, common::TEST_STATIC_CLIENT_ID)
        .await
        .unwrap());
}
