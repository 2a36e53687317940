//! Wire types shared between the auth gateway service and the client SDK.
//!
//! Keeping these in one crate guarantees the SDK deserializes exactly what
//! the gateway serializes, including the stable error codes in
//! [`ErrorResponse::error`].

use serde::{Deserialize, Serialize};

/// Normalized identity claims for an authenticated user.
///
/// `uid` and `email` are always non-empty by the time the gateway returns
/// this type; `display_name` and `photo_url` default to empty strings when
/// the identity token carries no value for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub photo_url: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Client application redirect URI after successful authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
}

/// Response body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Provider authorization URL the user should be redirected to.
    pub url: String,
}

/// Request body for `POST /auth/callback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackRequest {
    /// Authorization code from the identity provider.
    pub code: String,
    /// Opaque state blob round-tripped through the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Response body for `POST /auth/callback`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackResponse {
    /// Identity token issued by the trust issuer.
    pub token: String,
    pub user: UserData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Standard error body returned by every gateway endpoint.
///
/// `error` carries a stable machine-readable code from [`codes`]; clients
/// must classify on it rather than parsing `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Stable error codes carried in [`ErrorResponse::error`].
pub mod codes {
    pub const CONFIG_MISSING: &str = "config_missing";
    pub const REDIRECT_REQUIRED: &str = "redirect_required";
    pub const GATEWAY_URL_MISSING: &str = "gateway_url_missing";
    pub const AUTH_EXCHANGE_FAILED: &str = "auth_exchange_failed";
    pub const AUTH_SERVICE_TIMEOUT: &str = "auth_service_timeout";
    pub const TOKEN_EXPIRED: &str = "token_expired";
    pub const TOKEN_REVOKED: &str = "token_revoked";
    pub const TOKEN_INVALID: &str = "token_invalid";
    pub const TOKEN_VERIFICATION_FAILED: &str = "token_verification_failed";
    pub const MISSING_CLAIMS: &str = "missing_claims";
    pub const EMAIL_REQUIRED: &str = "email_required";
    pub const EMAIL_DOMAIN_REJECTED: &str = "email_domain_rejected";
    pub const INVALID_STATE: &str = "invalid_state";
    pub const VALIDATION_ERROR: &str = "validation_error";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const INTERNAL_ERROR: &str = "internal_error";
}
