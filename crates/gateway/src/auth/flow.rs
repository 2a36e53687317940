//! Authentication flow controller.
//!
//! Composes the state codec, token exchange, token verifier, and domain
//! policy into the two public operations: begin-login (build the provider
//! authorization URL) and complete-login (run the five-step trust
//! pipeline). Each call is independent; no state is shared across requests.

use axum::http::HeaderMap;
use shared_types::UserData;

use crate::auth::state::{self, AuthorizationState};
use crate::auth::verify::{extract_user_data, validate_claims};
use crate::config::GatewayConfig;
use crate::error::{AuthError, AuthResult};
use crate::AppState;

const PROVIDER_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const OAUTH_SCOPES: &str = "email profile";

/// Build the provider authorization URL for a new login.
///
/// The provider-facing redirect target is always the gateway's own
/// callback; the caller's redirect destination travels inside the encoded
/// state blob.
pub fn begin_login(app: &AppState, redirect_uri: Option<&str>) -> AuthResult<String> {
    let config = &app.config;

    if config.firebase_api_key.is_empty() || config.google_client_id.is_empty() {
        return Err(AuthError::ConfigMissing);
    }

    let final_redirect = redirect_uri
        .map(str::trim)
        .filter(|uri| !uri.is_empty())
        .map(str::to_string)
        .or_else(|| config.auth_redirect_url.clone())
        .ok_or(AuthError::RedirectRequired)?;

    if config.gateway_public_url.is_empty() {
        return Err(AuthError::GatewayUrlMissing);
    }
    let callback_url = format!("{}/auth/callback", config.gateway_public_url);

    let auth_state = AuthorizationState {
        redirect_uri: final_redirect,
        callback_url: callback_url.clone(),
    };
    let encoded_state =
        state::encode(&auth_state).map_err(|e| AuthError::Internal(e.into()))?;

    tracing::debug!("creating provider authorization URL with gateway callback");

    let query = [
        format!(
            "client_id={}",
            urlencoding::encode(&config.google_client_id)
        ),
        format!("redirect_uri={}", urlencoding::encode(&callback_url)),
        "response_type=code".to_string(),
        format!("scope={}", urlencoding::encode(OAUTH_SCOPES)),
        format!("state={}", encoded_state),
    ];

    Ok(format!("{}?{}", PROVIDER_AUTH_URL, query.join("&")))
}

/// Resolve the callback URL the token exchange must present.
///
/// Fallback chain, in order: callback_url carried in state, reconstruction
/// from the state's redirect_uri, reconstruction from forwarded request
/// headers, and finally the issuer auth domain.
pub fn resolve_callback_url(
    config: &GatewayConfig,
    auth_state: Option<&AuthorizationState>,
    headers: Option<&HeaderMap>,
) -> String {
    if let Some(s) = auth_state {
        if !s.callback_url.is_empty() {
            tracing::debug!("using callback URL from state");
            return s.callback_url.clone();
        }
        if !s.redirect_uri.is_empty() {
            if let Ok(parsed) = reqwest::Url::parse(&s.redirect_uri) {
                if let Some(host) = parsed.host_str() {
                    let mut base = format!("{}://{}", parsed.scheme(), host);
                    if let Some(port) = parsed.port() {
                        base.push_str(&format!(":{}", port));
                    }
                    tracing::debug!("constructed callback URL from redirect URI");
                    return format!("{}/auth/callback", base);
                }
            }
        }
    }

    if let Some(headers) = headers {
        let host = headers
            .get("host")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !host.is_empty() {
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("http");
            tracing::debug!("using fallback callback URL from request headers");
            return format!("{}://{}/auth/callback", scheme, host);
        }
    }

    tracing::debug!("using issuer auth domain as callback URL fallback");
    format!("https://{}/auth/callback", config.firebase_auth_domain)
}

/// Run the complete-login pipeline with an already-decoded state.
///
/// Steps: resolve callback → two-hop exchange → verify → validate claims →
/// enforce domain policy. Failures from each step propagate unchanged.
pub async fn complete_login_with_state(
    app: &AppState,
    code: &str,
    auth_state: Option<AuthorizationState>,
    headers: Option<&HeaderMap>,
) -> AuthResult<(String, UserData)> {
    let callback_url = resolve_callback_url(&app.config, auth_state.as_ref(), headers);

    let token = app.exchanger.exchange(code, &callback_url).await?;

    let claims = app.verifier.verify(&token).await?;

    let user = extract_user_data(&claims);
    validate_claims(&user)?;

    app.policy.enforce(&user.email)?;

    Ok((token, user))
}

/// Decode the state blob and run the complete-login pipeline.
pub async fn complete_login(
    app: &AppState,
    code: &str,
    state_param: Option<&str>,
    headers: Option<&HeaderMap>,
) -> AuthResult<(String, UserData)> {
    let auth_state = state::decode(state_param);
    complete_login_with_state(app, code, auth_state, headers).await
}
