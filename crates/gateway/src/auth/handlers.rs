//! Authentication HTTP handlers.
//!
//! Thin transport layer over the flow controller: request validation, then
//! one call into [`crate::auth::flow`], then success/failure presentation.
//! The structured and redirect callback variants run the identical
//! pipeline; only the presentation differs.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use shared_types::{
    CallbackRequest, CallbackResponse, HealthResponse, LoginRequest, LoginResponse,
    LogoutResponse, UserData,
};

use crate::auth::{flow, state as state_codec, verify};
use crate::error::{AuthError, AuthResult};
use crate::AppState;

const MAX_CODE_LEN: usize = 2048;
const MAX_STATE_LEN: usize = 4096;

/// `POST /auth/login` — generate a provider authorization URL.
pub async fn login(
    State(app): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AuthResult<Json<LoginResponse>> {
    if let Some(uri) = request.redirect_uri.as_deref() {
        validate_redirect_uri(uri)?;
    }

    let url = flow::begin_login(&app, request.redirect_uri.as_deref())?;
    tracing::info!("authentication URL generated");
    Ok(Json(LoginResponse { url }))
}

/// `POST /auth/callback` — structured completion for programmatic callers.
pub async fn auth_callback(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CallbackRequest>,
) -> AuthResult<Json<CallbackResponse>> {
    let code = request.code.trim();
    if code.is_empty() {
        return Err(AuthError::Validation(
            "Authorization code cannot be empty".to_string(),
        ));
    }
    if code.len() > MAX_CODE_LEN {
        return Err(AuthError::Validation(
            "Authorization code too long".to_string(),
        ));
    }
    if request.state.as_deref().is_some_and(|s| s.len() > MAX_STATE_LEN) {
        return Err(AuthError::Validation("State parameter too long".to_string()));
    }

    let (token, user) =
        flow::complete_login(&app, code, request.state.as_deref(), Some(&headers)).await?;

    tracing::info!("authentication callback completed");
    Ok(Json(CallbackResponse { token, user }))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
    pub state: Option<String>,
}

/// `GET /auth/callback` — browser variant; redirects back to the client
/// with the identity token, or renders a plain failure page.
pub async fn auth_callback_redirect(
    State(app): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let auth_state = state_codec::decode(params.state.as_deref());

    let redirect_uri = match auth_state
        .as_ref()
        .map(|s| s.redirect_uri.clone())
        .filter(|uri| !uri.is_empty())
    {
        Some(uri) => uri,
        None => {
            tracing::warn!("authentication callback failed: invalid state parameter");
            return failure_page(AuthError::InvalidState);
        }
    };

    match flow::complete_login_with_state(&app, &params.code, auth_state, Some(&headers)).await
    {
        Ok((token, _user)) => {
            tracing::info!("authentication callback completed, redirecting to client");
            Redirect::to(&format!("{}?token={}", redirect_uri, token)).into_response()
        }
        Err(err) => failure_page(err),
    }
}

/// `POST /verify-token` — verify a bearer token and return user data.
pub async fn verify_token(
    State(app): State<AppState>,
    headers: HeaderMap,
) -> AuthResult<Json<UserData>> {
    let token = verify::extract_bearer_token(&headers)?;

    let claims = app.verifier.verify(&token).await?;
    let user = verify::extract_user_data(&claims);
    verify::validate_claims(&user)?;
    app.policy.enforce(&user.email)?;

    tracing::debug!("token verification completed");
    Ok(Json(user))
}

/// `POST /auth/logout` — stateless; clients clear their own tokens.
pub async fn logout() -> Json<LogoutResponse> {
    tracing::info!("logout request processed");
    Json(LogoutResponse {
        status: "ok".to_string(),
        message: Some("Logout successful".to_string()),
    })
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "auth-gateway".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    })
}

/// `GET /ping` — minimal probe for load balancers.
pub async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn validate_redirect_uri(uri: &str) -> AuthResult<()> {
    let parsed = reqwest::Url::parse(uri).map_err(|_| {
        AuthError::Validation("redirect_uri must be a valid URL".to_string())
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AuthError::Validation(
            "redirect_uri must start with http:// or https://".to_string(),
        ));
    }
    if parsed.host_str().is_none() {
        return Err(AuthError::Validation(
            "redirect_uri must be a valid URL".to_string(),
        ));
    }
    Ok(())
}

/// Plain-text failure body with a status matching the error kind.
fn failure_page(err: AuthError) -> Response {
    tracing::warn!("authentication callback failed: {}", err);
    (err.status_code(), format!("Authentication failed: {}", err)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_uri_must_be_http_or_https() {
        assert!(validate_redirect_uri("https://client.example/cb").is_ok());
        assert!(validate_redirect_uri("http://localhost:3000/cb").is_ok());
        assert!(validate_redirect_uri("ftp://client.example/cb").is_err());
        assert!(validate_redirect_uri("not a url").is_err());
    }

    #[test]
    fn failure_page_status_matches_error_kind() {
        assert_eq!(
            failure_page(AuthError::InvalidState).status(),
            axum::http::StatusCode::BAD_REQUEST
        );
        assert_eq!(
            failure_page(AuthError::EmailDomainRejected).status(),
            axum::http::StatusCode::FORBIDDEN
        );
        assert_eq!(
            failure_page(AuthError::TokenExpired).status(),
            axum::http::StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            failure_page(AuthError::ExchangeFailed("Authentication failed".into())).status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
