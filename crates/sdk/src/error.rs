//! Typed errors for the SDK.
//!
//! Gateway failures are classified from the stable `error` code in the
//! wire body, never from message text.

use shared_types::{codes, ErrorResponse};
use thiserror::Error;

/// Errors surfaced by [`crate::GatewayClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The SDK itself is misconfigured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure after exhausting retries.
    #[error("network error: {0}")]
    Network(String),

    /// Gateway rate limit still exceeded after backoff.
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("token expired: {0}")]
    TokenExpired(String),

    /// Token invalid, malformed, or missing required claims.
    #[error("token invalid: {0}")]
    TokenInvalid(String),

    /// The authenticated email failed the gateway's domain policy.
    #[error("domain not allowed: {0}")]
    DomainNotAllowed(String),

    /// Other authentication failure (expired code, bad state, ...).
    #[error("authentication failed ({code}): {message}")]
    Authentication { code: String, message: String },

    /// The gateway answered, but not with the expected shape.
    #[error("unexpected gateway response: {0}")]
    UnexpectedResponse(String),

    /// Any other gateway-reported failure.
    #[error("gateway error {status} ({code}): {message}")]
    Gateway {
        status: u16,
        code: String,
        message: String,
    },
}

/// Map a gateway error body to a typed error.
pub(crate) fn classify(status: u16, body: ErrorResponse) -> ClientError {
    match body.error.as_str() {
        codes::TOKEN_EXPIRED => ClientError::TokenExpired(body.message),
        codes::TOKEN_INVALID | codes::TOKEN_VERIFICATION_FAILED | codes::MISSING_CLAIMS => {
            ClientError::TokenInvalid(body.message)
        }
        codes::EMAIL_DOMAIN_REJECTED | codes::EMAIL_REQUIRED => {
            ClientError::DomainNotAllowed(body.message)
        }
        codes::RATE_LIMITED => ClientError::RateLimited,
        _ if status == 401 || status == 403 => ClientError::Authentication {
            code: body.error,
            message: body.message,
        },
        _ => ClientError::Gateway {
            status,
            code: body.error,
            message: body.message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(code: &str) -> ErrorResponse {
        ErrorResponse {
            error: code.to_string(),
            message: "msg".to_string(),
            details: None,
        }
    }

    #[test]
    fn classification_uses_wire_code_not_message() {
        // Message text mentioning "expired" must not influence the kind.
        let misleading = ErrorResponse {
            error: codes::EMAIL_DOMAIN_REJECTED.to_string(),
            message: "token expired maybe? no: domain".to_string(),
            details: None,
        };
        assert!(matches!(
            classify(403, misleading),
            ClientError::DomainNotAllowed(_)
        ));
    }

    #[test]
    fn token_codes_map_to_token_errors() {
        assert!(matches!(
            classify(401, body(codes::TOKEN_EXPIRED)),
            ClientError::TokenExpired(_)
        ));
        assert!(matches!(
            classify(401, body(codes::TOKEN_INVALID)),
            ClientError::TokenInvalid(_)
        ));
        assert!(matches!(
            classify(401, body(codes::MISSING_CLAIMS)),
            ClientError::TokenInvalid(_)
        ));
    }

    #[test]
    fn unknown_401_is_generic_authentication_failure() {
        assert!(matches!(
            classify(401, body("something_else")),
            ClientError::Authentication { .. }
        ));
    }

    #[test]
    fn server_errors_surface_status_and_code() {
        match classify(500, body(codes::AUTH_EXCHANGE_FAILED)) {
            ClientError::Gateway { status, code, .. } => {
                assert_eq!(status, 500);
                assert_eq!(code, codes::AUTH_EXCHANGE_FAILED);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
