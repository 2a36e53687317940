//! Unified error handling for the gateway.
//!
//! Every failure in the authentication pipeline is an [`AuthError`] kind.
//! The `IntoResponse` impl translates each kind to its HTTP status and a
//! stable wire body `{error, message, details?}`; handlers can use `?`
//! throughout. Internal detail (source errors, upstream bodies) is logged
//! here and never leaks to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared_types::{codes, ErrorResponse};
use thiserror::Error;

/// Error taxonomy for the authentication pipeline.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Provider client id or issuer key not configured.
    #[error("Authentication configuration missing")]
    ConfigMissing,

    /// No client redirect URI given and no default configured.
    #[error("Client redirect URI not provided and no default configured")]
    RedirectRequired,

    /// Gateway public URL not configured.
    #[error("Gateway public URL not configured")]
    GatewayUrlMissing,

    /// A provider or issuer hop of the code exchange failed.
    #[error("{0}")]
    ExchangeFailed(String),

    /// A provider or issuer hop timed out.
    #[error("Authentication service timeout")]
    ServiceTimeout,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token revoked")]
    TokenRevoked,

    /// Token failed signature or structural validation.
    #[error("{0}")]
    TokenInvalid(String),

    /// Catch-all for verification failures that are none of the above.
    #[error("Token verification failed")]
    VerificationFailed,

    /// Verified token lacks a non-empty uid or email.
    #[error("Token missing required user information")]
    MissingClaims,

    #[error("Email address is required")]
    EmailRequired,

    #[error("Email domain not allowed")]
    EmailDomainRejected,

    /// State blob could not be decoded or lacks a redirect target.
    #[error("Invalid state parameter or missing redirect URI")]
    InvalidState,

    /// Malformed request input (bad redirect URI, oversized fields).
    #[error("{0}")]
    Validation(String),

    #[error("An internal error occurred")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Stable machine-readable code carried in the wire body.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::ConfigMissing => codes::CONFIG_MISSING,
            AuthError::RedirectRequired => codes::REDIRECT_REQUIRED,
            AuthError::GatewayUrlMissing => codes::GATEWAY_URL_MISSING,
            AuthError::ExchangeFailed(_) => codes::AUTH_EXCHANGE_FAILED,
            AuthError::ServiceTimeout => codes::AUTH_SERVICE_TIMEOUT,
            AuthError::TokenExpired => codes::TOKEN_EXPIRED,
            AuthError::TokenRevoked => codes::TOKEN_REVOKED,
            AuthError::TokenInvalid(_) => codes::TOKEN_INVALID,
            AuthError::VerificationFailed => codes::TOKEN_VERIFICATION_FAILED,
            AuthError::MissingClaims => codes::MISSING_CLAIMS,
            AuthError::EmailRequired => codes::EMAIL_REQUIRED,
            AuthError::EmailDomainRejected => codes::EMAIL_DOMAIN_REJECTED,
            AuthError::InvalidState => codes::INVALID_STATE,
            AuthError::Validation(_) => codes::VALIDATION_ERROR,
            AuthError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::RedirectRequired
            | AuthError::EmailRequired
            | AuthError::InvalidState
            | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::TokenExpired
            | AuthError::TokenRevoked
            | AuthError::TokenInvalid(_)
            | AuthError::VerificationFailed
            | AuthError::MissingClaims => StatusCode::UNAUTHORIZED,
            AuthError::EmailDomainRejected => StatusCode::FORBIDDEN,
            AuthError::ConfigMissing
            | AuthError::GatewayUrlMissing
            | AuthError::ExchangeFailed(_)
            | AuthError::ServiceTimeout
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Internal(ref e) = self {
            tracing::error!("internal error: {:?}", e);
        }

        let body = Json(ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
            details: None,
        });

        (self.status_code(), body).into_response()
    }
}

/// Result type alias for gateway handlers and services.
pub type AuthResult<T> = Result<T, AuthError>;
