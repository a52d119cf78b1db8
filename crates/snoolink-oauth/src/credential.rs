//! The persisted OAuth credential and its expiry state.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::oauth::TokenResponse;

/// Lifetime assumed when the authorization server omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Longest lifetime accepted from a token response. Larger values are
/// clamped so `expires_at` stays representable.
pub const MAX_EXPIRES_IN_SECS: u64 = 366 * 24 * 3600;

/// An OAuth access/refresh token pair plus expiry and scope.
///
/// Serialized as `{access_token, refresh_token, expires_at, scope}` with
/// `expires_at` in unix seconds and `scope` space-separated.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,
    #[serde(default, with = "scope_list")]
    pub scope: BTreeSet<String>,
}

impl Credential {
    /// Build a credential from a token endpoint response received at `now`.
    pub fn from_token_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        let expires_in = response
            .expires_in
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS)
            .min(MAX_EXPIRES_IN_SECS);
        let expires_at = i64::try_from(expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.filter(|t| !t.is_empty()),
            expires_at,
            scope: parse_scope(response.scope.as_deref().unwrap_or_default()),
        }
    }

    /// Space-separated scope string, as Reddit writes it.
    pub fn scope_string(&self) -> String {
        join_scope(&self.scope)
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Expiry state of a present credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Valid,
    Expired,
}

/// Classify a credential against `now`. Valid strictly before `expires_at`.
pub fn state_of(credential: &Credential, now: DateTime<Utc>) -> TokenState {
    if now < credential.expires_at {
        TokenState::Valid
    } else {
        TokenState::Expired
    }
}

/// Split a space-separated scope string into a set.
pub fn parse_scope(scope: &str) -> BTreeSet<String> {
    scope.split_whitespace().map(str::to_string).collect()
}

/// Join a scope set into Reddit's space-separated form.
pub fn join_scope(scope: &BTreeSet<String>) -> String {
    scope.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

mod scope_list {
    use std::collections::BTreeSet;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        scope: &BTreeSet<String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::join_scope(scope))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeSet<String>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(super::parse_scope(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credential(expires_at: DateTime<Utc>) -> Credential {
        Credential {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at,
            scope: parse_scope("identity read"),
        }
    }

    #[test]
    fn test_state_of_boundaries() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        assert_eq!(
            state_of(&credential(now + Duration::seconds(1)), now),
            TokenState::Valid
        );
        assert_eq!(state_of(&credential(now), now), TokenState::Expired);
        assert_eq!(
            state_of(&credential(now - Duration::seconds(1)), now),
            TokenState::Expired
        );
    }

    #[test]
    fn test_from_token_response() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let response = TokenResponse {
            access_token: "abc".to_string(),
            token_type: Some("bearer".to_string()),
            expires_in: Some(86400),
            refresh_token: Some("def".to_string()),
            scope: Some("read identity".to_string()),
        };

        let cred = Credential::from_token_response(response, now);
        assert_eq!(cred.access_token, "abc");
        assert_eq!(cred.refresh_token.as_deref(), Some("def"));
        assert_eq!(cred.expires_at, now + Duration::seconds(86400));
        assert!(cred.scope.contains("read"));
        assert!(cred.scope.contains("identity"));
    }

    #[test]
    fn test_from_token_response_defaults() {
        let now = Utc::now();
        let response = TokenResponse {
            access_token: "abc".to_string(),
            token_type: None,
            expires_in: None,
            refresh_token: Some(String::new()),
            scope: None,
        };

        let cred = Credential::from_token_response(response, now);
        assert_eq!(
            cred.expires_at,
            now + Duration::seconds(DEFAULT_EXPIRES_IN_SECS as i64)
        );
        assert!(cred.refresh_token.is_none());
        assert!(cred.scope.is_empty());
    }

    #[test]
    fn test_from_token_response_clamps_huge_lifetime() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        for expires_in in [i64::MAX as u64, u64::MAX] {
            let response = TokenResponse {
                access_token: "abc".to_string(),
                token_type: None,
                expires_in: Some(expires_in),
                refresh_token: None,
                scope: None,
            };

            let cred = Credential::from_token_response(response, now);
            assert_eq!(
                cred.expires_at,
                now + Duration::seconds(MAX_EXPIRES_IN_SECS as i64)
            );
            assert_eq!(state_of(&cred, now), TokenState::Valid);
        }
    }

    #[test]
    fn test_json_shape() {
        let cred = credential(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        let json = serde_json::to_value(&cred).unwrap();

        assert_eq!(json["access_token"], "access");
        assert_eq!(json["refresh_token"], "refresh");
        assert_eq!(json["expires_at"], 1_700_000_000i64);
        assert_eq!(json["scope"], "identity read");

        let back: Credential = serde_json::from_value(json).unwrap();
        assert_eq!(back, cred);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", credential(Utc::now()));
        assert!(!debug.contains("access\""));
        assert!(debug.contains("<redacted>"));
    }
}
