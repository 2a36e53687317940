//! Auth gateway: brokers the three-party OAuth/OpenID handshake between a
//! client application, the identity provider, and the token issuer.
//!
//! The gateway is fully stateless; trust lives only inside the signed
//! identity tokens it brokers, never in server-side state.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod config;
pub mod error;

use auth::{handlers, DomainPolicy, TokenExchange, TokenVerifier};
use config::GatewayConfig;

/// Shared per-process state; cheap to clone, immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub policy: Arc<DomainPolicy>,
    pub exchanger: Arc<dyn TokenExchange>,
    pub verifier: Arc<dyn TokenVerifier>,
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        .route("/ping", get(handlers::ping))
        // Authentication flow
        .route("/auth/login", post(handlers::login))
        .route("/auth/callback", post(handlers::auth_callback))
        .route("/auth/callback", get(handlers::auth_callback_redirect))
        .route("/auth/logout", post(handlers::logout))
        // Token verification for downstream services
        .route("/verify-token", post(handlers::verify_token))
        .with_state(state)
}
