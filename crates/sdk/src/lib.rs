//! Client SDK for the auth gateway.
//!
//! Downstream applications treat the gateway as their trust boundary: this
//! crate generates login URLs, verifies identity tokens, and reports
//! gateway health, surfacing the gateway's error taxonomy as typed
//! [`error::ClientError`] values. Transient transport failures and HTTP
//! 429 responses are retried with bounded exponential backoff;
//! authentication failures never are.

pub mod client;
pub mod config;
pub mod error;

pub use client::GatewayClient;
pub use config::ClientConfig;
pub use error::ClientError;

// Re-export the wire types callers interact with.
pub use shared_types::{HealthResponse, LoginResponse, LogoutResponse, UserData};
