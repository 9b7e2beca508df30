use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

/// A token is handed out only while it has at least this many seconds left.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Lifetime assumed when the identity endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Bearer token with its expiry instant.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Build a token from an `expires_in` lifetime as returned by the identity endpoint.
    pub fn from_lifetime(value: impl Into<String>, expires_in: Option<u64>, now: DateTime<Utc>) -> Self {
        let secs = expires_in
            .and_then(|s| i64::try_from(s).ok())
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        Self::new(value, now + Duration::seconds(secs))
    }

    /// Whether the token may still be returned to a caller at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Failures while obtaining a token.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialError {
    #[error("Graph credentials are not configured (missing {0})")]
    NotConfigured(&'static str),

    #[error("Identity endpoint rejected the token exchange: {0}")]
    Rejected(String),

    #[error("Identity endpoint unreachable: {0}")]
    Unreachable(String),
}

/// Source of bearer tokens for authenticated upstream calls.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a token that is valid for at least `REFRESH_MARGIN_SECS` more seconds.
    async fn get_token(&self) -> Result<AccessToken, CredentialError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_outside_margin() {
        let now = Utc::now();
        let token = AccessToken::new("t", now + Duration::seconds(61));
        assert!(token.is_usable_at(now));
    }

    #[test]
    fn test_not_usable_inside_margin() {
        let now = Utc::now();
        assert!(!AccessToken::new("t", now + Duration::seconds(60)).is_usable_at(now));
        assert!(!AccessToken::new("t", now + Duration::seconds(5)).is_usable_at(now));
        assert!(!AccessToken::new("t", now - Duration::seconds(5)).is_usable_at(now));
    }

    #[test]
    fn test_from_lifetime_defaults_to_one_hour() {
        let now = Utc::now();
        let token = AccessToken::from_lifetime("t", None, now);
        assert_eq!(token.expires_at, now + Duration::seconds(3600));

        let token = AccessToken::from_lifetime("t", Some(120), now);
        assert_eq!(token.expires_at, now + Duration::seconds(120));
    }

    #[test]
    fn test_debug_redacts_value() {
        let token = AccessToken::new("secret-value", Utc::now());
        assert!(!format!("{:?}", token).contains("secret-value"));
    }
}
