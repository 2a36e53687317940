//! Codec for the OAuth `state` parameter.
//!
//! The state blob carries the caller's redirect destination and the
//! gateway's own callback address across the provider round-trip. It is
//! not signed or encrypted: it is a carrier, not a credential, and the
//! identity token's own signature remains the trust anchor.

use serde::{Deserialize, Serialize};

/// Context round-tripped through the identity provider for one login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationState {
    /// Where to send the user after a successful login.
    pub redirect_uri: String,
    /// The gateway callback URL the provider redirects back to.
    pub callback_url: String,
}

/// Encode state as compact JSON, percent-encoded once for query embedding.
pub fn encode(state: &AuthorizationState) -> Result<String, serde_json::Error> {
    let raw = serde_json::to_string(state)?;
    Ok(urlencoding::encode(&raw).into_owned())
}

/// Decode a state blob back into [`AuthorizationState`].
///
/// Older clients double-encoded the blob, so a failed parse after one
/// percent-decode is retried after a second decode. Returns `None` for
/// empty, missing, or unparseable input; decoding never fails loudly.
pub fn decode(blob: Option<&str>) -> Option<AuthorizationState> {
    let blob = blob?.trim();
    if blob.is_empty() {
        return None;
    }

    let once = urlencoding::decode(blob).ok()?;
    if let Ok(state) = serde_json::from_str::<AuthorizationState>(&once) {
        tracing::debug!("state parameter decoded");
        return Some(state);
    }

    let twice = urlencoding::decode(&once).ok()?;
    match serde_json::from_str::<AuthorizationState>(&twice) {
        Ok(state) => {
            tracing::debug!("state parameter double-decoded");
            Some(state)
        }
        Err(_) => {
            tracing::warn!("failed to parse state parameter");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AuthorizationState {
        AuthorizationState {
            redirect_uri: "https://client.example/cb".to_string(),
            callback_url: "https://auth.example.com/auth/callback".to_string(),
        }
    }

    #[test]
    fn round_trip() {
        let state = sample();
        let blob = encode(&state).expect("should encode");
        assert_eq!(decode(Some(&blob)), Some(state));
    }

    #[test]
    fn encoded_blob_is_query_safe() {
        let blob = encode(&sample()).expect("should encode");
        assert!(!blob.contains('{'));
        assert!(!blob.contains('"'));
        assert!(!blob.contains('&'));
    }

    #[test]
    fn legacy_double_encoded_blob_decodes() {
        let state = sample();
        let once = encode(&state).expect("should encode");
        let twice = urlencoding::encode(&once).into_owned();
        assert_eq!(decode(Some(&twice)), Some(state));
    }

    #[test]
    fn plain_json_decodes() {
        // A blob that was already query-decoded by the HTTP layer.
        let raw = serde_json::to_string(&sample()).expect("should serialize");
        assert_eq!(decode(Some(&raw)), Some(sample()));
    }

    #[test]
    fn empty_and_missing_yield_none() {
        assert_eq!(decode(None), None);
        assert_eq!(decode(Some("")), None);
        assert_eq!(decode(Some("   ")), None);
    }

    #[test]
    fn garbage_yields_none() {
        assert_eq!(decode(Some("not json")), None);
        assert_eq!(decode(Some("%7Bnot-json%7D")), None);
        assert_eq!(decode(Some("%ZZ")), None);
    }
}
