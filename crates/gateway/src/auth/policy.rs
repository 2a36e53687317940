//! Email domain policy evaluation.
//!
//! A single regex over the full email string decides access. The pattern is
//! compiled once at startup; an empty or invalid pattern is coerced to the
//! allow-all sentinel so the policy can never be left in a failing state.
//! Matching errors fail open (allow), never closed.

use regex::Regex;

use crate::error::{AuthError, AuthResult};

/// Sentinel pattern meaning "no restriction".
pub const ALLOW_ALL: &str = ".*";

/// Regex-based allow rule applied to authenticated email addresses.
///
/// Matching is left-anchored over the full email string and case-sensitive;
/// a policy wanting case-insensitivity encodes `(?i)` in the pattern.
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    pattern: String,
    regex: Regex,
}

impl DomainPolicy {
    /// Build a policy from a configured pattern.
    ///
    /// Empty and syntactically invalid patterns fall back to [`ALLOW_ALL`];
    /// construction never fails.
    pub fn new(pattern: &str) -> Self {
        let trimmed = pattern.trim();
        let effective = if trimmed.is_empty() { ALLOW_ALL } else { trimmed };

        match compile_anchored(effective) {
            Ok(regex) => Self {
                pattern: effective.to_string(),
                regex,
            },
            Err(err) => {
                tracing::warn!(
                    "invalid email domain pattern {:?}: {}; allowing all domains",
                    effective,
                    err
                );
                Self {
                    pattern: ALLOW_ALL.to_string(),
                    regex: compile_anchored(ALLOW_ALL).expect("allow-all pattern compiles"),
                }
            }
        }
    }

    /// Whether a restriction is actually in force.
    pub fn is_restricted(&self) -> bool {
        self.pattern != ALLOW_ALL
    }

    /// Whether the email is permitted. Empty emails are always denied,
    /// even under an unrestricted policy.
    pub fn allows(&self, email: &str) -> bool {
        if email.is_empty() {
            tracing::warn!("empty email provided for domain validation");
            return false;
        }

        if !self.is_restricted() {
            return true;
        }

        let allowed = self.regex.is_match(email);
        if !allowed {
            tracing::info!("email rejected by domain policy");
        }
        allowed
    }

    /// Reject with a typed error instead of a boolean.
    ///
    /// Empty email is a distinct failure from a domain mismatch.
    pub fn enforce(&self, email: &str) -> AuthResult<()> {
        if email.is_empty() {
            return Err(AuthError::EmailRequired);
        }
        if !self.allows(email) {
            tracing::warn!("access denied: email domain not allowed");
            return Err(AuthError::EmailDomainRejected);
        }
        Ok(())
    }
}

/// Anchor the pattern at the start of the email string.
fn compile_anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})", pattern))
}
