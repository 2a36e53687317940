//! HTTP client for the auth gateway.

use std::time::Duration;

use shared_types::{
    ErrorResponse, HealthResponse, LoginRequest, LoginResponse, LogoutResponse, UserData,
};

use crate::config::ClientConfig;
use crate::error::{classify, ClientError};

/// Client for the auth gateway API.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl GatewayClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ClientError::Configuration(err.to_string()))?;

        Ok(Self { http, config })
    }

    /// Build a client from just a base URL with default settings.
    pub fn from_url(base_url: &str) -> Result<Self, ClientError> {
        Self::new(ClientConfig::new(base_url)?)
    }

    /// Build a client from `AUTH_GATEWAY_*` environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Request a provider login URL for the given redirect destination.
    pub async fn login_url(
        &self,
        redirect_uri: Option<&str>,
    ) -> Result<LoginResponse, ClientError> {
        let body = LoginRequest {
            redirect_uri: redirect_uri.map(str::to_string),
        };
        let url = format!("{}/auth/login", self.config.base_url);

        let response = self
            .send_with_retry(|| self.http.post(&url).json(&body))
            .await?;
        Self::parse_json(Self::check_status(response).await?).await
    }

    /// Verify an identity token and return the user's claims.
    ///
    /// Fails immediately on an empty token; a request cannot help.
    pub async fn verify_token(&self, token: &str) -> Result<UserData, ClientError> {
        if token.is_empty() {
            return Err(ClientError::TokenInvalid(
                "token cannot be empty".to_string(),
            ));
        }

        let url = format!("{}/verify-token", self.config.base_url);
        let response = self
            .send_with_retry(|| self.http.post(&url).bearer_auth(token))
            .await?;
        Self::parse_json(Self::check_status(response).await?).await
    }

    /// Check gateway health.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.config.base_url);
        let response = self.send_with_retry(|| self.http.get(&url)).await?;
        Self::parse_json(Self::check_status(response).await?).await
    }

    /// Logout. The gateway is stateless; this exists for API symmetry and
    /// clients remain responsible for discarding their tokens.
    pub async fn logout(&self) -> Result<LogoutResponse, ClientError> {
        let url = format!("{}/auth/logout", self.config.base_url);
        let response = self.send_with_retry(|| self.http.post(&url)).await?;
        Self::parse_json(Self::check_status(response).await?).await
    }

    /// Send a request, retrying transport failures and 429 responses with
    /// exponential backoff. Authentication failures are never retried:
    /// re-presenting a rejected token cannot succeed.
    async fn send_with_retry(
        &self,
        build: impl Fn() -> reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ClientError> {
        let retries = self.config.retry_attempts;
        let mut attempt = 0u32;

        loop {
            match build().send().await {
                Ok(response) if response.status().as_u16() == 429 => {
                    if attempt >= retries {
                        return Err(ClientError::RateLimited);
                    }
                    let wait = backoff(attempt);
                    tracing::warn!("rate limited, retrying in {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
                Ok(response) => return Ok(response),
                Err(err) if is_transient(&err) && attempt < retries => {
                    let wait = backoff(attempt);
                    tracing::warn!("transport failure ({}), retrying in {:?}", err, wait);
                    tokio::time::sleep(wait).await;
                }
                Err(err) => return Err(ClientError::Network(err.to_string())),
            }
            attempt += 1;
        }
    }

    /// Turn a non-success response into a classified error.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status = status.as_u16();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorResponse>(&text).unwrap_or_else(|_| {
            ErrorResponse {
                error: "unknown".to_string(),
                message: format!("HTTP {}: {}", status, snippet(&text, 200)),
                details: None,
            }
        });

        Err(classify(status, body))
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::UnexpectedResponse(err.to_string()))
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// First `max` bytes of `text`, cut back to the nearest char boundary.
fn snippet(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(5))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum::{routing::get, routing::post, Json, Router};
    use shared_types::codes;

    use super::*;

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = listener.local_addr().expect("should have addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });
        format!("http://{}", addr)
    }

    fn user() -> UserData {
        UserData {
            uid: "u1".to_string(),
            email: "user@example.com".to_string(),
            display_name: "Test User".to_string(),
            photo_url: String::new(),
        }
    }

    #[tokio::test]
    async fn verify_token_returns_user_data() {
        let app = Router::new().route("/verify-token", post(|| async { Json(user()) }));
        let base = spawn(app).await;

        let client = GatewayClient::from_url(&base).expect("client");
        let got = client.verify_token("some-token").await.expect("verify");
        assert_eq!(got, user());
    }

    #[tokio::test]
    async fn empty_token_fails_without_a_request() {
        let client = GatewayClient::from_url("http://127.0.0.1:9").expect("client");
        assert!(matches!(
            client.verify_token("").await,
            Err(ClientError::TokenInvalid(_))
        ));
    }

    #[tokio::test]
    async fn domain_rejection_is_classified_and_not_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let app = Router::new().route(
            "/verify-token",
            post(move || {
                let seen = seen.clone();
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                    (
                        StatusCode::FORBIDDEN,
                        Json(ErrorResponse {
                            error: codes::EMAIL_DOMAIN_REJECTED.to_string(),
                            message: "Email domain not allowed".to_string(),
                            details: None,
                        }),
                    )
                }
            }),
        );
        let base = spawn(app).await;

        let client = GatewayClient::from_url(&base).expect("client");
        let err = client
            .verify_token("some-token")
            .await
            .expect_err("should fail");

        assert!(matches!(err, ClientError::DomainNotAllowed(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn snippet_cuts_on_char_boundaries() {
        assert_eq!(snippet("short", 200), "short");
        // Three-byte chars: 200 falls mid-char and must step back to 198.
        let body = "€".repeat(100);
        assert_eq!(snippet(&body, 200).len(), 198);
        assert_eq!(snippet(&body, 201).len(), 201);
    }

    #[tokio::test]
    async fn non_json_multibyte_error_body_is_classified() {
        // A proxy's HTML error page can be multibyte text; it must come back
        // as a typed error, never a panic.
        let app = Router::new().route(
            "/health",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "€".repeat(100)) }),
        );
        let base = spawn(app).await;

        let client = GatewayClient::from_url(&base).expect("client");
        let err = client.health().await.expect_err("should fail");
        match err {
            ClientError::Gateway {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 500);
                assert_eq!(code, "unknown");
                assert!(message.starts_with("HTTP 500: "));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn rate_limited_request_is_retried() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();
        let app = Router::new().route(
            "/health",
            get(move || {
                let seen = seen.clone();
                async move {
                    if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(StatusCode::TOO_MANY_REQUESTS)
                    } else {
                        Ok(Json(HealthResponse {
                            status: "ok".to_string(),
                            service: "auth-gateway".to_string(),
                            version: None,
                        }))
                    }
                }
            }),
        );
        let base = spawn(app).await;

        let client = GatewayClient::from_url(&base).expect("client");
        let health = client.health().await.expect("should recover");
        assert_eq!(health.status, "ok");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn login_url_posts_redirect_uri() {
        let app = Router::new().route(
            "/auth/login",
            post(|Json(req): Json<LoginRequest>| async move {
                Json(LoginResponse {
                    url: format!(
                        "https://accounts.google.com/o/oauth2/auth?state={}",
                        req.redirect_uri.unwrap_or_default()
                    ),
                })
            }),
        );
        let base = spawn(app).await;

        let client = GatewayClient::from_url(&base).expect("client");
        let login = client
            .login_url(Some("https://client.example/cb"))
            .await
            .expect("login url");
        assert!(login.url.contains("https://client.example/cb"));
    }
}
