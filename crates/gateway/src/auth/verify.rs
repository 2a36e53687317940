//! Identity token verification and claims handling.
//!
//! [`IssuerClient`] is the production trust client: it validates the token
//! signature against the issuer's published JWK set, checks audience,
//! issuer, and expiry, and folds a revocation check into the same pass. It
//! is constructed once at startup and shared by handle; there is no global
//! SDK state.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::Value;
use shared_types::UserData;
use tokio::sync::RwLock;

use crate::config::GatewayConfig;
use crate::error::{AuthError, AuthResult};

const ISSUER_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const ISSUER_LOOKUP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:lookup";

const VERIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Decoded identity token claims, prior to normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Subject id minted by the issuer.
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
    /// When the user last authenticated; compared against the issuer's
    /// `validSince` for revocation.
    #[serde(default)]
    pub auth_time: i64,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub exp: i64,
}

/// Seam for identity token verification, mockable in flow tests.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Validate signature, expiry, and revocation; return the raw claims.
    async fn verify(&self, token: &str) -> AuthResult<TokenClaims>;
}

/// Project raw claims onto the normalized wire shape.
///
/// Pure projection: never fails, missing optional claims become empty
/// strings. Required-claim enforcement lives in [`validate_claims`].
pub fn extract_user_data(claims: &TokenClaims) -> UserData {
    UserData {
        uid: claims.sub.clone(),
        email: claims.email.clone(),
        display_name: claims.name.clone(),
        photo_url: claims.picture.clone(),
    }
}

/// Reject claims lacking a non-empty uid or email.
pub fn validate_claims(user: &UserData) -> AuthResult<()> {
    if user.uid.is_empty() || user.email.is_empty() {
        tracing::warn!("token missing required claims");
        return Err(AuthError::MissingClaims);
    }
    Ok(())
}

/// Extract the bearer token from an `Authorization` header.
///
/// Exactly two space-separated parts with a case-insensitive `bearer`
/// scheme; anything else is a 401-class failure.
pub fn extract_bearer_token(headers: &HeaderMap) -> AuthResult<String> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AuthError::TokenInvalid("Authorization header missing".to_string()))?
        .to_str()
        .map_err(|_| invalid_header_format())?;

    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != 2 || !parts[0].eq_ignore_ascii_case("bearer") {
        return Err(invalid_header_format());
    }

    Ok(parts[1].to_string())
}

fn invalid_header_format() -> AuthError {
    AuthError::TokenInvalid(
        "Invalid authorization header format. Expected: Bearer <token>".to_string(),
    )
}

#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

/// Trust client for the token issuer.
///
/// Holds the issuer JWK set behind a lock; the set is fetched at startup
/// and refreshed when a token references an unknown key id (the issuer
/// rotates keys regularly).
pub struct IssuerClient {
    http: reqwest::Client,
    api_key: String,
    project_id: String,
    jwks_url: String,
    lookup_url: String,
    keys: RwLock<HashMap<String, Jwk>>,
}

impl IssuerClient {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(VERIFY_TIMEOUT).build()?;

        Ok(Self {
            http,
            api_key: config.firebase_api_key.clone(),
            project_id: config.firebase_project_id.clone(),
            jwks_url: ISSUER_JWKS_URL.to_string(),
            lookup_url: ISSUER_LOOKUP_URL.to_string(),
            keys: RwLock::new(HashMap::new()),
        })
    }

    /// Prefetch the issuer key set so the first login does not pay for it.
    pub async fn warm_up(&self) -> AuthResult<()> {
        self.refresh_keys().await
    }

    async fn refresh_keys(&self) -> AuthResult<()> {
        let set: JwkSet = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|err| {
                tracing::error!("failed to fetch issuer key set: {}", err);
                AuthError::VerificationFailed
            })?
            .json()
            .await
            .map_err(|err| {
                tracing::error!("invalid issuer key set response: {}", err);
                AuthError::VerificationFailed
            })?;

        let mut keys = self.keys.write().await;
        keys.clear();
        for jwk in set.keys {
            keys.insert(jwk.kid.clone(), jwk);
        }
        tracing::debug!("issuer key set refreshed ({} keys)", keys.len());
        Ok(())
    }

    async fn decoding_key_for(&self, kid: &str) -> AuthResult<DecodingKey> {
        if let Some(jwk) = self.keys.read().await.get(kid) {
            return decoding_key_from_jwk(jwk);
        }

        // Unknown kid: the issuer may have rotated keys since the last fetch.
        self.refresh_keys().await?;

        match self.keys.read().await.get(kid) {
            Some(jwk) => decoding_key_from_jwk(jwk),
            None => {
                tracing::warn!("token signed with unknown key id");
                Err(AuthError::TokenInvalid("Invalid token".to_string()))
            }
        }
    }

    /// Revocation check: a token issued before the account's `validSince`
    /// mark has been revoked, even if its signature is still valid.
    async fn check_revocation(&self, token: &str, claims: &TokenClaims) -> AuthResult<()> {
        let url = format!("{}?key={}", self.lookup_url, self.api_key);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "idToken": token }))
            .send()
            .await
            .map_err(|err| {
                tracing::error!("revocation lookup failed: {}", err);
                AuthError::VerificationFailed
            })?;

        if !response.status().is_success() {
            tracing::warn!("revocation lookup rejected with status {}", response.status());
            return Err(AuthError::TokenInvalid("Invalid token".to_string()));
        }

        let body: Value = response.json().await.map_err(|err| {
            tracing::error!("invalid revocation lookup response: {}", err);
            AuthError::VerificationFailed
        })?;

        let valid_since = body
            .get("users")
            .and_then(Value::as_array)
            .and_then(|users| users.first())
            .and_then(|user| user.get("validSince"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<i64>().ok());

        if is_revoked(claims.auth_time, valid_since) {
            tracing::warn!("token verification failed: token revoked");
            return Err(AuthError::TokenRevoked);
        }
        Ok(())
    }
}

#[async_trait]
impl TokenVerifier for IssuerClient {
    async fn verify(&self, token: &str) -> AuthResult<TokenClaims> {
        let header = decode_header(token)
            .map_err(|_| AuthError::TokenInvalid("Invalid token".to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::TokenInvalid("Invalid token".to_string()))?;

        let key = self.decoding_key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);

        let data =
            decode::<TokenClaims>(token, &key, &validation).map_err(map_verification_error)?;

        self.check_revocation(token, &data.claims).await?;

        tracing::debug!("token verification successful");
        Ok(data.claims)
    }
}

fn decoding_key_from_jwk(jwk: &Jwk) -> AuthResult<DecodingKey> {
    DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|err| {
        tracing::error!("issuer published an unusable key: {}", err);
        AuthError::VerificationFailed
    })
}

fn is_revoked(auth_time: i64, valid_since: Option<i64>) -> bool {
    match valid_since {
        Some(valid_since) => auth_time < valid_since,
        None => false,
    }
}

fn map_verification_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::ExpiredSignature => {
            tracing::warn!("token verification failed: token expired");
            AuthError::TokenExpired
        }
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::ImmatureSignature
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => {
            tracing::warn!("token verification failed: invalid token");
            AuthError::TokenInvalid("Invalid token".to_string())
        }
        _ => {
            tracing::error!("token verification failed");
            AuthError::VerificationFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn claims(sub: &str, email: &str) -> TokenClaims {
        TokenClaims {
            sub: sub.to_string(),
            email: email.to_string(),
            name: "Test User".to_string(),
            picture: String::new(),
            auth_time: 1_700_000_000,
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        }
    }

    #[test]
    fn extraction_is_a_pure_projection() {
        let user = extract_user_data(&claims("u1", "a@b.com"));
        assert_eq!(user.uid, "u1");
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.display_name, "Test User");
        assert_eq!(user.photo_url, "");
    }

    #[test]
    fn claims_without_uid_are_rejected() {
        let user = extract_user_data(&claims("", "x@y.com"));
        assert!(matches!(
            validate_claims(&user),
            Err(AuthError::MissingClaims)
        ));
    }

    #[test]
    fn claims_without_email_are_rejected() {
        let user = extract_user_data(&claims("u", ""));
        assert!(matches!(
            validate_claims(&user),
            Err(AuthError::MissingClaims)
        ));
    }

    #[test]
    fn complete_claims_pass_validation() {
        let user = extract_user_data(&claims("u", "e"));
        assert!(validate_claims(&user).is_ok());
    }

    #[test]
    fn missing_authorization_header_is_rejected() {
        let headers = HeaderMap::new();
        let err = extract_bearer_token(&headers).expect_err("should fail");
        match err {
            AuthError::TokenInvalid(msg) => assert_eq!(msg, "Authorization header missing"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn bearer_with_empty_token_is_invalid_format() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        let err = extract_bearer_token(&headers).expect_err("should fail");
        match err {
            AuthError::TokenInvalid(msg) => assert!(msg.contains("Invalid authorization header")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("bearer abc123"),
        );
        assert_eq!(
            extract_bearer_token(&headers).expect("should extract"),
            "abc123"
        );
    }

    #[test]
    fn extra_parts_are_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc def"),
        );
        assert!(extract_bearer_token(&headers).is_err());
    }

    #[test]
    fn revocation_compares_auth_time_to_valid_since() {
        assert!(is_revoked(100, Some(200)));
        assert!(!is_revoked(200, Some(200)));
        assert!(!is_revoked(300, Some(200)));
        assert!(!is_revoked(100, None));
    }

    #[test]
    fn garbage_token_maps_to_invalid() {
        let err = map_verification_error(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
        assert!(matches!(err, AuthError::TokenInvalid(_)));
        let err =
            map_verification_error(jsonwebtoken::errors::ErrorKind::ExpiredSignature.into());
        assert!(matches!(err, AuthError::TokenExpired));
    }
}
