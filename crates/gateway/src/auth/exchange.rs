//! Two-hop exchange of an authorization code for an issuer identity token.
//!
//! Hop 1 trades the provider authorization code for provider tokens; hop 2
//! forwards the provider ID token to the issuer's identity-linking endpoint
//! and receives the signed identity token callers ultimately trust. Both
//! hops fail fast: authorization codes are single-use, so nothing here
//! retries.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::{AuthError, AuthResult};

const PROVIDER_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const ISSUER_SIGNIN_URL: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:signInWithIdp";

/// Fixed timeout for each outbound hop.
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Seam for the code-for-token exchange, mockable in flow tests.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchange an authorization code for an issuer identity token.
    async fn exchange(&self, code: &str, callback_url: &str) -> AuthResult<String>;
}

/// Production exchanger talking to the real provider and issuer endpoints.
pub struct TokenExchanger {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    api_key: String,
    provider_token_url: String,
    issuer_signin_url: String,
}

impl TokenExchanger {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(EXCHANGE_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            api_key: config.firebase_api_key.clone(),
            provider_token_url: PROVIDER_TOKEN_URL.to_string(),
            issuer_signin_url: ISSUER_SIGNIN_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_endpoints(mut self, provider_token_url: &str, issuer_signin_url: &str) -> Self {
        self.provider_token_url = provider_token_url.to_string();
        self.issuer_signin_url = issuer_signin_url.to_string();
        self
    }

    /// Hop 1: provider authorization code → provider ID token.
    async fn exchange_provider_code(&self, code: &str, callback_url: &str) -> AuthResult<String> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", callback_url),
            ("grant_type", "authorization_code"),
        ];

        tracing::debug!("exchanging provider authorization code");

        let response = self
            .http
            .post(&self.provider_token_url)
            .form(&params)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            tracing::error!(
                "provider token exchange failed with status {}",
                response.status()
            );
            return Err(AuthError::ExchangeFailed(
                "Authentication failed".to_string(),
            ));
        }

        let body: Value = response.json().await.map_err(map_transport_error)?;
        provider_token_from_response(&body)
    }

    /// Hop 2: provider ID token → issuer identity token.
    async fn exchange_issuer_token(
        &self,
        provider_token: &str,
        callback_url: &str,
    ) -> AuthResult<String> {
        let post_body = format!("id_token={}&providerId=google.com", provider_token);
        let params = [
            ("postBody", post_body.as_str()),
            ("requestUri", callback_url),
            ("returnIdpCredential", "false"),
            ("returnSecureToken", "true"),
        ];
        let url = format!("{}?key={}", self.issuer_signin_url, self.api_key);

        tracing::debug!("exchanging provider ID token for issuer token");

        let response = self
            .http
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            tracing::error!(
                "issuer token exchange failed with status {}",
                response.status()
            );
            return Err(AuthError::ExchangeFailed(
                "Authentication failed".to_string(),
            ));
        }

        let body: Value = response.json().await.map_err(map_transport_error)?;
        issuer_token_from_response(&body)
    }
}

#[async_trait]
impl TokenExchange for TokenExchanger {
    async fn exchange(&self, code: &str, callback_url: &str) -> AuthResult<String> {
        let provider_token = self.exchange_provider_code(code, callback_url).await?;
        self.exchange_issuer_token(&provider_token, callback_url)
            .await
    }
}

/// A successful provider response must still carry a non-empty `id_token`.
fn provider_token_from_response(body: &Value) -> AuthResult<String> {
    match body
        .get("id_token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
    {
        Some(token) => Ok(token.to_string()),
        None => {
            tracing::error!("provider token exchange succeeded but no ID token returned");
            Err(AuthError::ExchangeFailed(
                "Authentication failed: Invalid response from identity provider".to_string(),
            ))
        }
    }
}

/// A successful issuer response must still carry a non-empty `idToken`.
fn issuer_token_from_response(body: &Value) -> AuthResult<String> {
    match body
        .get("idToken")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
    {
        Some(token) => Ok(token.to_string()),
        None => {
            tracing::error!("issuer token exchange succeeded but no ID token returned");
            Err(AuthError::ExchangeFailed(
                "Authentication failed: Invalid response from token issuer".to_string(),
            ))
        }
    }
}

fn map_transport_error(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        tracing::error!("token exchange timed out");
        AuthError::ServiceTimeout
    } else {
        tracing::error!("token exchange transport failure: {}", err);
        AuthError::ExchangeFailed("Authentication failed".to_string())
    }
}
