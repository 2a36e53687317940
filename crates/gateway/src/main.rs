use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

use auth_gateway::auth::{DomainPolicy, IssuerClient, TokenExchanger};
use auth_gateway::config::GatewayConfig;
use auth_gateway::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = Arc::new(
        GatewayConfig::from_env().map_err(|msg| anyhow::anyhow!(msg))?,
    );

    let policy = Arc::new(DomainPolicy::new(&config.allowed_email_domain_regex));
    tracing::info!("domain restriction active: {}", policy.is_restricted());

    // The issuer trust client is built once and shared by handle; key
    // fetching is retried lazily on first verification if this fails.
    let verifier = Arc::new(IssuerClient::new(&config)?);
    if let Err(err) = verifier.warm_up().await {
        tracing::warn!("could not prefetch issuer key set: {}", err);
    }

    let exchanger = Arc::new(TokenExchanger::new(&config)?);

    let state = AppState {
        config: config.clone(),
        policy,
        exchanger,
        verifier,
    };

    let app = auth_gateway::router(state).layer(build_cors_layer(&config.cors_allowed_origins));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("auth gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build CORS layer from the configured origin list.
///
/// With no origins configured the layer is permissive, which is only
/// acceptable for development.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<_> = allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!(
            "CORS_ALLOWED_ORIGINS not set, using permissive CORS (not recommended for production)"
        );
        return CorsLayer::permissive();
    }

    tracing::info!("CORS configured for {} origins", origins.len());
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
