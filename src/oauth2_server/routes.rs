// ABOUTME: OAuth HTTP route handlers for the axum web framework
// ABOUTME: Wires authorization, token exchange, registration, login, and discovery endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Gatehouse Project

use super::client_registration::ClientRegistrationManager;
use super::endpoints::OAuth2AuthorizationServer;
use super::models::{
    AuthorizeOutcome, AuthorizeRequest, ClientRegistrationRequest, OAuth2Error, TokenRequest,
};
use super::rate_limiting::{rate_limit_middleware, OAuth2RateLimiter};
use crate::auth::{verify_gate_password, SessionManager};
use crate::config::ServerConfig;
use crate::constants::{auth_methods, grant_types, response_types};
use crate::database_plugins::factory::Database;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::middleware;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

/// Shared state for the OAuth routes
#[derive(Clone)]
pub struct AppState {
    /// Shared database handle
    pub database: Arc<Database>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    fn authorization_server(&self) -> OAuth2AuthorizationServer {
        OAuth2AuthorizationServer::new(self.database.clone(), self.config.clone())
    }

    fn session_manager(&self) -> SessionManager {
        SessionManager::new(self.database.clone(), self.config.gate.session_ttl_hours)
    }
}

/// Build the OAuth route tree
pub fn oauth2_routes(
    database: Arc<Database>,
    config: Arc<ServerConfig>,
    rate_limiter: Arc<OAuth2RateLimiter>,
) -> Router {
    let state = AppState { database, config };

    Router::new()
        .route("/oauth/authorize", get(handle_authorization))
        .route("/oauth/token", post(handle_token))
        .route("/oauth/register", post(handle_client_registration))
        .route(
            "/oauth/login",
            get(handle_login_page).post(handle_login_submit),
        )
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ))
        .route(
            "/.well-known/oauth-authorization-server",
            get(handle_authorization_server_metadata),
        )
        .route(
            "/.well-known/oauth-protected-resource",
            get(handle_protected_resource_metadata),
        )
        .with_state(state)
}

/// Serialize an OAuth error with its HTTP status (400, or 500 for
/// `server_error`)
fn oauth_error_response(error: &OAuth2Error) -> Response {
    let status = if error.is_server_error() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(error.clone())).into_response()
}

/// Handle authorization request (GET /oauth/authorize)
async fn handle_authorization(
    State(state): State<AppState>,
    uri: Uri,
    headers: HeaderMap,
    Query(request): Query<AuthorizeRequest>,
) -> Response {
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());

    let authenticated = state.session_manager().is_authenticated(cookie_header).await;

    match state
        .authorization_server()
        .authorize(request, authenticated)
        .await
    {
        Ok(AuthorizeOutcome::Redirect {
            redirect_uri,
            code,
            state: client_state,
        }) => {
            let mut location = format!("{redirect_uri}?code={code}");
            if let Some(value) = client_state {
                write!(&mut location, "&state={}", urlencoding::encode(&value)).ok();
            }

            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        Ok(AuthorizeOutcome::LoginRequired) => {
            tracing::info!("No authenticated session, presenting login challenge");
            // The original request URL rides along so the flow replays after login
            Html(render_login_page(&uri.to_string(), false)).into_response()
        }
        Err(error) => {
            tracing::warn!(error = %error.error, "Authorization request rejected");
            oauth_error_response(&error)
        }
    }
}

/// Handle token request (POST /oauth/token)
async fn handle_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let request = match parse_token_request(&headers, &body) {
        Ok(request) => request,
        Err(error) => return oauth_error_response(&error),
    };

    match state.authorization_server().token(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => {
            tracing::warn!(error = %error.error, "Token exchange rejected");
            oauth_error_response(&error)
        }
    }
}

/// Parse a token request body, accepting form encoding or JSON
fn parse_token_request(
    headers: &HeaderMap,
    body: &[u8],
) -> Result<TokenRequest, OAuth2Error> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("application/json") {
        return serde_json::from_slice(body)
            .map_err(|_| OAuth2Error::invalid_request("Malformed JSON body"));
    }

    let params: HashMap<String, String> = url::form_urlencoded::parse(body)
        .into_owned()
        .collect();

    Ok(TokenRequest {
        grant_type: params.get("grant_type").cloned(),
        code: params.get("code").cloned(),
        redirect_uri: params.get("redirect_uri").cloned(),
        code_verifier: params.get("code_verifier").cloned(),
        client_id: params.get("client_id").cloned(),
        client_secret: params.get("client_secret").cloned(),
    })
}

/// Handle client registration (POST /oauth/register)
async fn handle_client_registration(
    State(state): State<AppState>,
    payload: Result<Json<ClientRegistrationRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            return oauth_error_response(&OAuth2Error::invalid_client_metadata(&format!(
                "Malformed registration request: {rejection}"
            )));
        }
    };

    let client_manager = ClientRegistrationManager::new(state.database.clone());

    match client_manager.register_client(request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(error) => {
            tracing::warn!(error = %error.error, "Client registration rejected");
            oauth_error_response(&error)
        }
    }
}

/// Query parameters for the standalone login page
#[derive(Debug, Deserialize)]
struct LoginPageQuery {
    return_to: Option<String>,
}

/// Form fields for the login submission
#[derive(Debug, Deserialize)]
struct LoginForm {
    password: String,
    return_to: Option<String>,
}

/// Handle login page (GET /oauth/login)
async fn handle_login_page(Query(query): Query<LoginPageQuery>) -> Response {
    let return_to = sanitize_return_to(query.return_to.as_deref());
    Html(render_login_page(&return_to, false)).into_response()
}

/// Handle login form submission (POST /oauth/login)
async fn handle_login_submit(
    State(state): State<AppState>,
    axum::Form(form): axum::Form<LoginForm>,
) -> Response {
    let return_to = sanitize_return_to(form.return_to.as_deref());

    if !verify_gate_password(&form.password, &state.config.gate.password_hash).await {
        tracing::warn!("Gate login failed: wrong password");
        return (
            StatusCode::UNAUTHORIZED,
            Html(render_login_page(&return_to, true)),
        )
            .into_response();
    }

    let session_manager = state.session_manager();
    match session_manager.create_authenticated().await {
        Ok(session) => {
            tracing::info!("Gate login successful, replaying authorization request");
            (
                StatusCode::FOUND,
                [
                    (header::LOCATION, return_to),
                    (header::SET_COOKIE, session_manager.session_cookie(&session)),
                ],
            )
                .into_response()
        }
        Err(error) => error.into_response(),
    }
}

/// Constrain the post-login redirect to the authorization endpoint so the
/// login form cannot be used as an open redirector
fn sanitize_return_to(return_to: Option<&str>) -> String {
    match return_to {
        Some(value) if value.starts_with("/oauth/authorize") => value.to_owned(),
        _ => "/oauth/authorize".to_owned(),
    }
}

/// Authorization server metadata (RFC 8414)
async fn handle_authorization_server_metadata(State(state): State<AppState>) -> Response {
    let issuer = &state.config.oauth2_server.issuer_url;
    Json(serde_json::json!({
        "issuer": issuer,
        "authorization_endpoint": format!("{issuer}/oauth/authorize"),
        "token_endpoint": format!("{issuer}/oauth/token"),
        "registration_endpoint": format!("{issuer}/oauth/register"),
        "grant_types_supported": [grant_types::AUTHORIZATION_CODE],
        "response_types_supported": [response_types::CODE],
        "response_modes_supported": ["query"],
        "token_endpoint_auth_methods_supported": [
            auth_methods::CLIENT_SECRET_POST,
            auth_methods::CLIENT_SECRET_BASIC,
            auth_methods::NONE,
        ],
        "code_challenge_methods_supported": ["S256"],
        "scopes_supported": state.config.oauth2_server.default_scopes,
    }))
    .into_response()
}

/// Protected resource metadata (RFC 9728)
async fn handle_protected_resource_metadata(State(state): State<AppState>) -> Response {
    let issuer = &state.config.oauth2_server.issuer_url;
    Json(serde_json::json!({
        "resource": issuer,
        "authorization_servers": [issuer],
        "bearer_methods_supported": ["header"],
        "scopes_supported": state.config.oauth2_server.default_scopes,
    }))
    .into_response()
}

/// Render the login challenge. The form posts the shared password along with
/// the original authorization URL so the flow resumes where it left off.
fn render_login_page(return_to: &str, failed: bool) -> String {
    let return_to_attr = html_escape::encode_double_quoted_attribute(return_to);
    let error_banner = if failed {
        r#"<div class="error"><strong>Login failed:</strong> wrong password. Please try again.</div>"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Gatehouse - Login</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 40px; }}
        .login-form {{ max-width: 400px; margin: 0 auto; padding: 20px; border: 1px solid #ddd; border-radius: 8px; }}
        .form-group {{ margin-bottom: 15px; }}
        label {{ display: block; margin-bottom: 5px; font-weight: bold; }}
        input {{ width: 100%; padding: 8px; border: 1px solid #ccc; border-radius: 4px; }}
        button {{ background-color: #007bff; color: white; padding: 10px 20px; border: none; border-radius: 4px; cursor: pointer; }}
        button:hover {{ background-color: #0056b3; }}
        .error {{ color: red; background-color: #ffe6e6; padding: 15px; border-radius: 4px; margin-bottom: 20px; }}
    </style>
</head>
<body>
    <div class="login-form">
        <h2>Authorization Required</h2>
        {error_banner}
        <form method="post" action="/oauth/login">
            <input type="hidden" name="return_to" value="{return_to_attr}">
            <div class="form-group">
                <label for="password">Password:</label>
                <input type="password" id="password" name="password" required autofocus>
            </div>
            <button type="submit">Login and Authorize</button>
        </form>
    </div>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_return_to_blocks_external_targets() {
        assert_eq!(
            sanitize_return_to(Some("/oauth/authorize?client_id=x")),
            "/oauth/authorize?client_id=x"
        );
        assert_eq!(sanitize_return_to(Some("https://evil.example/")), "/oauth/authorize");
        assert_eq!(sanitize_return_to(None), "/oauth/authorize");
    }

    #[test]
    fn token_request_parses_form_and_json() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/x-www-form-urlencoded".parse().unwrap());
        let body = b"grant_type=authorization_code&code=abc&redirect_uri=http%3A%2F%2Flocalhost%3A9999%2Fcb&code_verifier=v";
        let parsed = parse_token_request(&headers, body).unwrap();
        assert_eq!(parsed.grant_type.as_deref(), Some("authorization_code"));
        assert_eq!(parsed.redirect_uri.as_deref(), Some("http://localhost:9999/cb"));
        assert!(parsed.client_id.is_none());

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        let body = br#"{"grant_type":"authorization_code","code":"abc","redirect_uri":"http://localhost:9999/cb","code_verifier":"v"}"#;
        let parsed = parse_token_request(&headers, body).unwrap();
        assert_eq!(parsed.code.as_deref(), Some("abc"));
    }
}
