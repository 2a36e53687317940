//! Gateway configuration loaded from environment variables.
//!
//! All validation happens once at startup; nothing re-reads the environment
//! per request.

/// Gateway configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// API key for the token issuer (Firebase web API key).
    pub firebase_api_key: String,
    /// Issuer auth domain, used as the last-resort callback host.
    pub firebase_auth_domain: String,
    /// Issuer project id; also the expected `aud` of identity tokens.
    pub firebase_project_id: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    /// Public base URL of this gateway, scheme-checked and slash-trimmed.
    pub gateway_public_url: String,
    /// Default client redirect URI when the login request carries none.
    pub auth_redirect_url: Option<String>,
    /// Regex applied to authenticated emails; `.*` means unrestricted.
    pub allowed_email_domain_regex: String,
    pub cors_allowed_origins: Vec<String>,
    pub port: u16,
}

impl GatewayConfig {
    /// Load gateway configuration from environment variables.
    ///
    /// Required env vars:
    /// - `FIREBASE_API_KEY`: issuer API key
    /// - `FIREBASE_AUTH_DOMAIN`: issuer auth domain
    /// - `FIREBASE_PROJECT_ID`: issuer project id
    /// - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`: provider OAuth client
    /// - `GATEWAY_PUBLIC_URL`: public base URL of this service
    ///
    /// Optional:
    /// - `AUTH_REDIRECT_URL`: default client redirect URI
    /// - `ALLOWED_EMAIL_DOMAIN_REGEX`: email allow pattern (default `.*`)
    /// - `CORS_ALLOWED_ORIGINS`: comma-separated origin list
    /// - `PORT`: listen port (default 8080)
    pub fn from_env() -> Result<Self, String> {
        let gateway_public_url = std::env::var("GATEWAY_PUBLIC_URL")
            .map_err(|_| "GATEWAY_PUBLIC_URL must be set".to_string())?;
        let gateway_public_url = normalize_public_url(&gateway_public_url)?;

        let cors_allowed_origins: Vec<String> = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| "PORT must be a valid port number".to_string())?;

        Ok(Self {
            firebase_api_key: std::env::var("FIREBASE_API_KEY")
                .map_err(|_| "FIREBASE_API_KEY must be set".to_string())?,
            firebase_auth_domain: std::env::var("FIREBASE_AUTH_DOMAIN")
                .map_err(|_| "FIREBASE_AUTH_DOMAIN must be set".to_string())?,
            firebase_project_id: std::env::var("FIREBASE_PROJECT_ID")
                .map_err(|_| "FIREBASE_PROJECT_ID must be set".to_string())?,
            google_client_id: std::env::var("GOOGLE_CLIENT_ID")
                .map_err(|_| "GOOGLE_CLIENT_ID must be set".to_string())?,
            google_client_secret: std::env::var("GOOGLE_CLIENT_SECRET")
                .map_err(|_| "GOOGLE_CLIENT_SECRET must be set".to_string())?,
            gateway_public_url,
            auth_redirect_url: std::env::var("AUTH_REDIRECT_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            allowed_email_domain_regex: std::env::var("ALLOWED_EMAIL_DOMAIN_REGEX")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| ".*".to_string()),
            cors_allowed_origins,
            port,
        })
    }
}

/// Require an http/https scheme and strip any trailing slash.
fn normalize_public_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err("GATEWAY_PUBLIC_URL must start with http:// or https://".to_string());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_trailing_slash_is_trimmed() {
        let url = normalize_public_url("https://auth.example.com/").expect("should be valid");
        assert_eq!(url, "https://auth.example.com");
    }

    #[test]
    fn public_url_requires_http_scheme() {
        assert!(normalize_public_url("ftp://auth.example.com").is_err());
        assert!(normalize_public_url("auth.example.com").is_err());
    }

    #[test]
    fn public_url_without_trailing_slash_unchanged() {
        let url = normalize_public_url("http://localhost:8080").expect("should be valid");
        assert_eq!(url, "http://localhost:8080");
    }
}
