//! Authentication flow core.
//!
//! This module holds the pieces of the token trust pipeline:
//! - state codec for the provider round-trip (`state`)
//! - two-hop code-for-token exchange (`exchange`)
//! - identity token verification and claims handling (`verify`)
//! - email domain policy (`policy`)
//! - the flow controller composing them (`flow`)
//! - HTTP handlers over the flow controller (`handlers`)

pub mod exchange;
pub mod flow;
pub mod handlers;
pub mod policy;
pub mod state;
pub mod verify;

pub use exchange::{TokenExchange, TokenExchanger};
pub use policy::DomainPolicy;
pub use state::AuthorizationState;
pub use verify::{IssuerClient, TokenVerifier};
